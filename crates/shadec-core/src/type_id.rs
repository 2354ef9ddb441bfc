//! TypeId and the type registry.
//!
//! Every type is registered in the [`TypeRegistry`] and addressed by a
//! [`TypeId`], giving O(1) identity comparison and arena ownership: all
//! types live for the whole compile and are freed together when the context
//! is dropped.
//!
//! On construction the registry pre-registers the predefined names: the six
//! scalar bases, `<base>N` vectors and `<base>NxM` matrices for N,M in 1..4,
//! the sampler family, `void`, and the effect-era aliases (DWORD, FLOAT,
//! VECTOR, MATRIX, STRING, TEXTURE, PIXELSHADER, VERTEXSHADER).

use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::types::{
    Modifiers, ObjectKind, SamplerDim, ScalarBase, StructField, Type, TypeKind,
};

/// Unique identifier for a type in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handles to the predefined types, filled in by [`TypeRegistry::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinTypes {
    /// Scalar types indexed by base rank.
    pub scalar: [TypeId; 6],
    /// Vector types indexed by `[base][dimx - 1]`.
    pub vector: [[TypeId; 4]; 6],
    /// Sampler types indexed by dimension.
    pub sampler: [TypeId; 5],
    pub void: TypeId,
}

/// Registry of all types in a compile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRegistry {
    types: Vec<Type>,
    builtin: BuiltinTypes,
}

impl TypeRegistry {
    /// Creates a registry with all predefined types installed.
    pub fn new() -> Self {
        let mut reg = TypeRegistry {
            types: Vec::new(),
            builtin: BuiltinTypes {
                scalar: [TypeId(0); 6],
                vector: [[TypeId(0); 4]; 6],
                sampler: [TypeId(0); 5],
                void: TypeId(0),
            },
        };

        for (bt, base) in ScalarBase::ALL.into_iter().enumerate() {
            for y in 1..=4u32 {
                for x in 1..=4u32 {
                    let name = format!("{}{}x{}", base.name(), y, x);
                    reg.register(Type {
                        name: Some(name),
                        kind: TypeKind::Matrix {
                            base,
                            dimx: x,
                            dimy: y,
                        },
                        modifiers: Modifiers::empty(),
                        dimx: x,
                        dimy: y,
                        reg_size: x,
                    });

                    if y == 1 {
                        let id = reg.register(Type {
                            name: Some(format!("{}{}", base.name(), x)),
                            kind: TypeKind::Vector { base, dimx: x },
                            modifiers: Modifiers::empty(),
                            dimx: x,
                            dimy: 1,
                            reg_size: 1,
                        });
                        reg.builtin.vector[bt][(x - 1) as usize] = id;

                        if x == 1 {
                            let id = reg.register(Type {
                                name: Some(base.name().to_string()),
                                kind: TypeKind::Scalar { base },
                                modifiers: Modifiers::empty(),
                                dimx: 1,
                                dimy: 1,
                                reg_size: 1,
                            });
                            reg.builtin.scalar[bt] = id;
                        }
                    }
                }
            }
        }

        for (i, dim) in SamplerDim::ALL.into_iter().enumerate() {
            let id = reg.register(Type {
                name: Some(dim.name().to_string()),
                kind: TypeKind::Object {
                    kind: ObjectKind::Sampler(dim),
                },
                modifiers: Modifiers::empty(),
                dimx: 1,
                dimy: 1,
                reg_size: 1,
            });
            reg.builtin.sampler[i] = id;
        }

        reg.builtin.void = reg.register(Type {
            name: Some("void".to_string()),
            kind: TypeKind::Object {
                kind: ObjectKind::Void,
            },
            modifiers: Modifiers::empty(),
            dimx: 1,
            dimy: 1,
            reg_size: 1,
        });

        let effect_types: [(&str, TypeKind, u32, u32); 8] = [
            (
                "DWORD",
                TypeKind::Scalar {
                    base: ScalarBase::Int,
                },
                1,
                1,
            ),
            (
                "FLOAT",
                TypeKind::Scalar {
                    base: ScalarBase::Float,
                },
                1,
                1,
            ),
            (
                "VECTOR",
                TypeKind::Vector {
                    base: ScalarBase::Float,
                    dimx: 4,
                },
                4,
                1,
            ),
            (
                "MATRIX",
                TypeKind::Matrix {
                    base: ScalarBase::Float,
                    dimx: 4,
                    dimy: 4,
                },
                4,
                4,
            ),
            (
                "STRING",
                TypeKind::Object {
                    kind: ObjectKind::String,
                },
                1,
                1,
            ),
            (
                "TEXTURE",
                TypeKind::Object {
                    kind: ObjectKind::Texture,
                },
                1,
                1,
            ),
            (
                "PIXELSHADER",
                TypeKind::Object {
                    kind: ObjectKind::PixelShader,
                },
                1,
                1,
            ),
            (
                "VERTEXSHADER",
                TypeKind::Object {
                    kind: ObjectKind::VertexShader,
                },
                1,
                1,
            ),
        ];
        for (name, kind, dimx, dimy) in effect_types {
            let reg_size = if matches!(kind, TypeKind::Matrix { .. }) {
                dimx
            } else {
                1
            };
            reg.register(Type {
                name: Some(name.to_string()),
                kind,
                modifiers: Modifiers::empty(),
                dimx,
                dimy,
                reg_size,
            });
        }

        reg
    }

    fn register(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Looks up a type, returning `None` for an id from another registry.
    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.0 as usize)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All named types, in registration order. Used to populate the globals
    /// scope's name lookup at context init.
    pub fn named_types(&self) -> impl Iterator<Item = (TypeId, &str)> {
        self.types.iter().enumerate().filter_map(|(i, ty)| {
            ty.name
                .as_deref()
                .map(|name| (TypeId(i as u32), name))
        })
    }

    /// Predefined-type handles.
    pub fn builtin(&self) -> &BuiltinTypes {
        &self.builtin
    }

    /// The predefined scalar type for `base`.
    pub fn scalar(&self, base: ScalarBase) -> TypeId {
        self.builtin.scalar[base as usize]
    }

    /// The predefined vector type `base`x`dimx`, `dimx` in 1..4.
    pub fn vector(&self, base: ScalarBase, dimx: u32) -> TypeId {
        self.builtin.vector[base as usize][(dimx - 1) as usize]
    }

    /// The predefined sampler type for `dim`.
    pub fn sampler(&self, dim: SamplerDim) -> TypeId {
        self.builtin.sampler[dim as usize]
    }

    pub fn void(&self) -> TypeId {
        self.builtin.void
    }

    /// Whether `id` is the void type. Void is object-class, so this cannot
    /// be expressed as a numeric check.
    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(
            self[id].kind,
            TypeKind::Object {
                kind: ObjectKind::Void
            }
        )
    }

    /// Constructs an anonymous matrix type. The majority bit in `modifiers`
    /// selects the register layout; column-major is assumed when unset.
    pub fn new_matrix(
        &mut self,
        base: ScalarBase,
        dimx: u32,
        dimy: u32,
        modifiers: Modifiers,
    ) -> TypeId {
        let reg_size = if modifiers.contains(Modifiers::ROW_MAJOR) {
            dimy
        } else {
            dimx
        };
        self.register(Type {
            name: None,
            kind: TypeKind::Matrix { base, dimx, dimy },
            modifiers,
            dimx,
            dimy,
            reg_size,
        })
    }

    /// Constructs an array type. Dimensions and modifiers are carried over
    /// from the element type.
    pub fn new_array_type(&mut self, element: TypeId, count: u32) -> TypeId {
        let elem = &self[element];
        let (dimx, dimy) = (elem.dimx, elem.dimy);
        let modifiers = elem.modifiers;
        let reg_size = elem.reg_size * count;
        self.register(Type {
            name: None,
            kind: TypeKind::Array { element, count },
            modifiers,
            dimx,
            dimy,
            reg_size,
        })
    }

    /// Constructs a struct type, assigning each field its cumulative
    /// register offset.
    pub fn new_struct_type(&mut self, name: Option<String>, mut fields: Vec<StructField>) -> TypeId {
        let mut reg_size = 0;
        let mut dimx = 0;
        for field in &mut fields {
            field.reg_offset = reg_size;
            let ft = &self.types[field.ty.0 as usize];
            reg_size += ft.reg_size;
            dimx += ft.dimx * ft.dimy * self.flat_array_count(field.ty);
        }
        self.register(Type {
            name,
            kind: TypeKind::Struct { fields },
            modifiers: Modifiers::empty(),
            dimx,
            dimy: 1,
            reg_size,
        })
    }

    /// Flattened element count: the product of array lengths down to the
    /// innermost non-array type.
    fn flat_array_count(&self, id: TypeId) -> u32 {
        match &self[id].kind {
            TypeKind::Array { element, count } => count * self.flat_array_count(*element),
            _ => 1,
        }
    }

    /// Structural type equality.
    ///
    /// Classes, scalar bases, sampler dimensions, majority bits and
    /// dimensions must match; struct fields are compared pairwise by type
    /// *and* name, and arrays by element type and count.
    pub fn equal(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        let (t1, t2) = (&self[a], &self[b]);
        if t1.modifiers & Modifiers::MAJORITY != t2.modifiers & Modifiers::MAJORITY {
            return false;
        }
        if t1.dimx != t2.dimx || t1.dimy != t2.dimy {
            return false;
        }
        match (&t1.kind, &t2.kind) {
            (TypeKind::Scalar { base: b1 }, TypeKind::Scalar { base: b2 }) => b1 == b2,
            (TypeKind::Vector { base: b1, .. }, TypeKind::Vector { base: b2, .. }) => b1 == b2,
            (TypeKind::Matrix { base: b1, .. }, TypeKind::Matrix { base: b2, .. }) => b1 == b2,
            (
                TypeKind::Array {
                    element: e1,
                    count: c1,
                },
                TypeKind::Array {
                    element: e2,
                    count: c2,
                },
            ) => c1 == c2 && self.equal(*e1, *e2),
            (TypeKind::Struct { fields: f1 }, TypeKind::Struct { fields: f2 }) => {
                f1.len() == f2.len()
                    && f1.iter().zip(f2).all(|(a, b)| {
                        a.name == b.name && self.equal(a.ty, b.ty)
                    })
            }
            (TypeKind::Object { kind: k1 }, TypeKind::Object { kind: k2 }) => k1 == k2,
            _ => false,
        }
    }

    /// Base-type rank for the overload comparator. Arrays take the rank of a
    /// dummy numeric base and structs the rank of void, so that same-class
    /// comparisons fall through to the recursive checks.
    fn base_rank(&self, ty: &Type) -> u32 {
        match &ty.kind {
            TypeKind::Scalar { base }
            | TypeKind::Vector { base, .. }
            | TypeKind::Matrix { base, .. } => *base as u32,
            TypeKind::Array { .. } => 0,
            TypeKind::Struct { .. } => 11,
            TypeKind::Object { kind } => match kind {
                ObjectKind::Sampler(_) => 6,
                ObjectKind::Texture => 7,
                ObjectKind::PixelShader => 8,
                ObjectKind::VertexShader => 9,
                ObjectKind::String => 10,
                ObjectKind::Void => 11,
            },
        }
    }

    /// Total ordering over parameter types, used to key function overloads.
    ///
    /// Identical to structural equality with one special rule: a scalar and
    /// a vector of the same dimx order equal, so `float` and `float1`
    /// resolve to the same overload slot.
    pub fn compare_params(&self, a: TypeId, b: TypeId) -> Ordering {
        let (t1, t2) = (&self[a], &self[b]);
        let (r1, r2) = (t1.kind.class_rank(), t2.kind.class_rank());
        if r1 != r2 {
            let scalar_vector = matches!(
                (&t1.kind, &t2.kind),
                (TypeKind::Scalar { .. }, TypeKind::Vector { .. })
                    | (TypeKind::Vector { .. }, TypeKind::Scalar { .. })
            );
            if !scalar_vector {
                return r1.cmp(&r2);
            }
        }
        let cmp = self.base_rank(t1).cmp(&self.base_rank(t2));
        if cmp != Ordering::Equal {
            return cmp;
        }
        if let (
            TypeKind::Object {
                kind: ObjectKind::Sampler(d1),
            },
            TypeKind::Object {
                kind: ObjectKind::Sampler(d2),
            },
        ) = (&t1.kind, &t2.kind)
        {
            let cmp = d1.cmp(d2);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        let cmp = (t1.modifiers & Modifiers::MAJORITY)
            .bits()
            .cmp(&(t2.modifiers & Modifiers::MAJORITY).bits());
        if cmp != Ordering::Equal {
            return cmp;
        }
        let cmp = t1.dimx.cmp(&t2.dimx);
        if cmp != Ordering::Equal {
            return cmp;
        }
        let cmp = t1.dimy.cmp(&t2.dimy);
        if cmp != Ordering::Equal {
            return cmp;
        }
        match (&t1.kind, &t2.kind) {
            (TypeKind::Struct { fields: f1 }, TypeKind::Struct { fields: f2 }) => {
                for (a, b) in f1.iter().zip(f2.iter()) {
                    let cmp = self.compare_params(a.ty, b.ty);
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                    let cmp = a.name.cmp(&b.name);
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                }
                f1.len().cmp(&f2.len())
            }
            (
                TypeKind::Array {
                    element: e1,
                    count: c1,
                },
                TypeKind::Array {
                    element: e2,
                    count: c2,
                },
            ) => {
                let cmp = c1.cmp(c2);
                if cmp != Ordering::Equal {
                    return cmp;
                }
                self.compare_params(*e1, *e2)
            }
            _ => Ordering::Equal,
        }
    }

    /// Deep-copies a type, folding `default_majority` into any level whose
    /// majority bits are unset. Used when the parser applies pragma-defined
    /// matrix layout defaults.
    pub fn clone_with_majority(&mut self, id: TypeId, default_majority: Modifiers) -> TypeId {
        let old = self[id].clone();
        let mut modifiers = old.modifiers;
        if !modifiers.intersects(Modifiers::MAJORITY) {
            modifiers |= default_majority;
        }

        let (kind, reg_size) = match old.kind {
            TypeKind::Array { element, count } => {
                let element = self.clone_with_majority(element, default_majority);
                let reg_size = self[element].reg_size * count;
                (TypeKind::Array { element, count }, reg_size)
            }
            TypeKind::Struct { fields } => {
                let mut reg_size = 0;
                let mut cloned = Vec::with_capacity(fields.len());
                for field in fields {
                    let ty = self.clone_with_majority(field.ty, default_majority);
                    let field_size = self[ty].reg_size;
                    cloned.push(StructField {
                        reg_offset: reg_size,
                        ty,
                        ..field
                    });
                    reg_size += field_size;
                }
                (TypeKind::Struct { fields: cloned }, reg_size)
            }
            TypeKind::Matrix { base, dimx, dimy } => {
                let reg_size = if modifiers.contains(Modifiers::ROW_MAJOR) {
                    dimy
                } else {
                    dimx
                };
                (TypeKind::Matrix { base, dimx, dimy }, reg_size)
            }
            kind => (kind, 1),
        };

        self.register(Type {
            name: old.name,
            kind,
            modifiers,
            dimx: old.dimx,
            dimy: old.dimy,
            reg_size,
        })
    }

    /// Total scalar component count of a type: dimx times dimy for numeric
    /// types, recursive for arrays and structs.
    pub fn component_count(&self, id: TypeId) -> u32 {
        let ty = &self[id];
        match &ty.kind {
            TypeKind::Scalar { .. } | TypeKind::Vector { .. } | TypeKind::Matrix { .. } => {
                ty.dimx * ty.dimy
            }
            TypeKind::Array { element, count } => self.component_count(*element) * count,
            TypeKind::Struct { fields } => fields
                .iter()
                .map(|field| self.component_count(field.ty))
                .sum(),
            TypeKind::Object { .. } => 0,
        }
    }

    /// Renders a type for diagnostics. Named types print their name;
    /// anonymous matrices print rows before columns, matching the
    /// predefined naming.
    pub fn to_string(&self, id: TypeId) -> String {
        let ty = &self[id];
        if let Some(name) = &ty.name {
            return name.clone();
        }
        let mut out = String::new();
        match &ty.kind {
            TypeKind::Scalar { base } => out.push_str(base.name()),
            TypeKind::Vector { base, dimx } => {
                let _ = write!(out, "{}{}", base.name(), dimx);
            }
            TypeKind::Matrix { base, dimx, dimy } => {
                let _ = write!(out, "{}{}x{}", base.name(), dimy, dimx);
            }
            TypeKind::Array { .. } => {
                let mut inner = id;
                while let TypeKind::Array { element, .. } = &self[inner].kind {
                    inner = *element;
                }
                out.push_str(&self.to_string(inner));
                let mut cursor = id;
                while let TypeKind::Array { element, count } = &self[cursor].kind {
                    let _ = write!(out, "[{}]", count);
                    cursor = *element;
                }
            }
            TypeKind::Struct { .. } => out.push_str("<anonymous struct>"),
            TypeKind::Object { kind } => {
                let name = match kind {
                    ObjectKind::Void => "void",
                    ObjectKind::Sampler(dim) => dim.name(),
                    ObjectKind::Texture => "texture",
                    ObjectKind::String => "string",
                    ObjectKind::PixelShader => "pixelshader",
                    ObjectKind::VertexShader => "vertexshader",
                };
                out.push_str(name);
            }
        }
        out
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<TypeId> for TypeRegistry {
    type Output = Type;

    fn index(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }
}
