//! The shading-language type vocabulary.
//!
//! A [`Type`] is one of six classes: scalar, vector, matrix, array, struct,
//! or object (void, samplers, textures, effect-era objects). Numeric types
//! carry one of six scalar bases. Every type caches its dimensions and its
//! *register size* -- the number of 4-component slots it occupies when laid
//! out into the flat register file.
//!
//! Types are immutable after construction (except through
//! [`TypeRegistry::clone_with_majority`](crate::type_id::TypeRegistry::clone_with_majority),
//! which builds a new type) and are owned by the registry for the lifetime
//! of the compile.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::diag::SourceLocation;
use crate::type_id::TypeId;

/// Numeric scalar base types, in overload-ordering rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarBase {
    Float,
    Half,
    Double,
    Int,
    Uint,
    Bool,
}

impl ScalarBase {
    /// All bases, in rank order. Used to install the predefined type names.
    pub const ALL: [ScalarBase; 6] = [
        ScalarBase::Float,
        ScalarBase::Half,
        ScalarBase::Double,
        ScalarBase::Int,
        ScalarBase::Uint,
        ScalarBase::Bool,
    ];

    /// The source-level spelling of this base.
    pub fn name(self) -> &'static str {
        match self {
            ScalarBase::Float => "float",
            ScalarBase::Half => "half",
            ScalarBase::Double => "double",
            ScalarBase::Int => "int",
            ScalarBase::Uint => "uint",
            ScalarBase::Bool => "bool",
        }
    }
}

/// Sampler dimensionality tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SamplerDim {
    Generic,
    Dim1D,
    Dim2D,
    Dim3D,
    Cube,
}

impl SamplerDim {
    pub const ALL: [SamplerDim; 5] = [
        SamplerDim::Generic,
        SamplerDim::Dim1D,
        SamplerDim::Dim2D,
        SamplerDim::Dim3D,
        SamplerDim::Cube,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SamplerDim::Generic => "sampler",
            SamplerDim::Dim1D => "sampler1D",
            SamplerDim::Dim2D => "sampler2D",
            SamplerDim::Dim3D => "sampler3D",
            SamplerDim::Cube => "samplerCUBE",
        }
    }
}

/// The object-class type kinds. `void` is deliberately an object type; this
/// matters for overload selection with void returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Void,
    Sampler(SamplerDim),
    Texture,
    String,
    PixelShader,
    VertexShader,
}

bitflags! {
    /// Storage and type modifier bits.
    ///
    /// The two majority bits select matrix register layout and are material
    /// for matrices only, but they participate in structural type equality
    /// for every class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u32 {
        const EXTERN = 0x0001;
        const NOINTERPOLATION = 0x0002;
        const PRECISE = 0x0004;
        const SHARED = 0x0008;
        const GROUPSHARED = 0x0010;
        const STATIC = 0x0020;
        const UNIFORM = 0x0040;
        const VOLATILE = 0x0080;
        const CONST = 0x0100;
        const ROW_MAJOR = 0x0200;
        const COLUMN_MAJOR = 0x0400;
        const IN = 0x0800;
        const OUT = 0x1000;
    }
}

impl Modifiers {
    /// The matrix-majority bits.
    pub const MAJORITY: Modifiers = Modifiers::ROW_MAJOR.union(Modifiers::COLUMN_MAJOR);
}

/// A named, typed struct field with an optional semantic and its cumulative
/// register offset within the struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub ty: TypeId,
    pub semantic: Option<String>,
    pub modifiers: Modifiers,
    /// Cumulative register offset of this field, assigned by
    /// [`TypeRegistry::new_struct_type`](crate::type_id::TypeRegistry::new_struct_type).
    pub reg_offset: u32,
    pub loc: SourceLocation,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        StructField {
            name: name.into(),
            ty,
            semantic: None,
            modifiers: Modifiers::empty(),
            reg_offset: 0,
            loc: SourceLocation::default(),
        }
    }

    pub fn with_semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = Some(semantic.into());
        self
    }
}

/// The per-class payload of a type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeKind {
    Scalar { base: ScalarBase },
    Vector { base: ScalarBase, dimx: u32 },
    Matrix { base: ScalarBase, dimx: u32, dimy: u32 },
    Array { element: TypeId, count: u32 },
    Struct { fields: Vec<StructField> },
    Object { kind: ObjectKind },
}

impl TypeKind {
    /// Class rank used by the overload-ordering comparator: scalar, vector,
    /// matrix, array, struct, object.
    pub fn class_rank(&self) -> u32 {
        match self {
            TypeKind::Scalar { .. } => 0,
            TypeKind::Vector { .. } => 1,
            TypeKind::Matrix { .. } => 2,
            TypeKind::Array { .. } => 3,
            TypeKind::Struct { .. } => 4,
            TypeKind::Object { .. } => 5,
        }
    }

    /// True for scalar, vector and matrix types.
    pub fn is_numeric(&self) -> bool {
        self.class_rank() <= 2
    }
}

/// A type, with its cached dimensions and register size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Type {
    /// Present for predefined and user-named types; anonymous otherwise.
    pub name: Option<String>,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    /// Component columns: vector length, matrix columns, element columns for
    /// arrays, total component count for structs, 1 for objects.
    pub dimx: u32,
    /// Component rows: matrix rows; 1 elsewhere.
    pub dimy: u32,
    /// Number of 4-component register slots this type occupies.
    pub reg_size: u32,
}

impl Type {
    /// The scalar base of a numeric type.
    pub fn scalar_base(&self) -> Option<ScalarBase> {
        match self.kind {
            TypeKind::Scalar { base }
            | TypeKind::Vector { base, .. }
            | TypeKind::Matrix { base, .. } => Some(base),
            _ => None,
        }
    }

    /// Whether this type lays out matrices row-major. Column-major is the
    /// default when neither majority bit is set.
    pub fn is_row_major(&self) -> bool {
        self.modifiers.contains(Modifiers::ROW_MAJOR)
    }

    /// Scalars and vectors fit into a single register slot.
    pub fn is_single_reg(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Scalar { .. } | TypeKind::Vector { .. }
        )
    }

    /// Scalars and one-component vectors are interchangeable for cast
    /// folding.
    pub fn is_vec1(&self) -> bool {
        match self.kind {
            TypeKind::Scalar { .. } => true,
            TypeKind::Vector { dimx, .. } => dimx == 1,
            _ => false,
        }
    }
}

/// A typed literal: one value per scalar component, stored per base type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Float([f32; 4]),
    Half([f32; 4]),
    Double([f64; 4]),
    Int([i32; 4]),
    Uint([u32; 4]),
    Bool([bool; 4]),
}

impl ConstValue {
    pub fn base(&self) -> ScalarBase {
        match self {
            ConstValue::Float(_) => ScalarBase::Float,
            ConstValue::Half(_) => ScalarBase::Half,
            ConstValue::Double(_) => ScalarBase::Double,
            ConstValue::Int(_) => ScalarBase::Int,
            ConstValue::Uint(_) => ScalarBase::Uint,
            ConstValue::Bool(_) => ScalarBase::Bool,
        }
    }
}
