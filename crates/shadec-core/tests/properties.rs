//! Property tests for the type system: comparator laws, clone idempotence,
//! and register-size consistency over randomly generated types.

use proptest::prelude::*;

use shadec_core::type_id::{TypeId, TypeRegistry};
use shadec_core::types::{Modifiers, ScalarBase, StructField, TypeKind};

/// A registry-independent description of a type, realised per test case.
#[derive(Debug, Clone)]
enum TyShape {
    Scalar(u8),
    Vector(u8, u8),
    Matrix(u8, u8, u8, bool),
    Array(Box<TyShape>, u8),
    Struct(Vec<(String, TyShape)>),
}

fn base(index: u8) -> ScalarBase {
    ScalarBase::ALL[(index % 6) as usize]
}

fn dim(raw: u8) -> u32 {
    (raw % 4 + 1) as u32
}

fn ty_shape() -> impl Strategy<Value = TyShape> {
    let leaf = prop_oneof![
        any::<u8>().prop_map(TyShape::Scalar),
        (any::<u8>(), any::<u8>()).prop_map(|(b, x)| TyShape::Vector(b, x)),
        (any::<u8>(), any::<u8>(), any::<u8>(), any::<bool>())
            .prop_map(|(b, x, y, rm)| TyShape::Matrix(b, x, y, rm)),
    ];
    leaf.prop_recursive(3, 12, 4, |inner| {
        prop_oneof![
            (inner.clone(), 1u8..4).prop_map(|(e, n)| TyShape::Array(Box::new(e), n)),
            prop::collection::vec(("[a-d]{1,3}", inner), 1..4)
                .prop_map(TyShape::Struct),
        ]
    })
}

fn realize(reg: &mut TypeRegistry, shape: &TyShape) -> TypeId {
    match shape {
        TyShape::Scalar(b) => reg.scalar(base(*b)),
        TyShape::Vector(b, x) => reg.vector(base(*b), dim(*x)),
        TyShape::Matrix(b, x, y, row_major) => {
            let majority = if *row_major {
                Modifiers::ROW_MAJOR
            } else {
                Modifiers::COLUMN_MAJOR
            };
            reg.new_matrix(base(*b), dim(*x), dim(*y), majority)
        }
        TyShape::Array(element, count) => {
            let element = realize(reg, element);
            reg.new_array_type(element, *count as u32)
        }
        TyShape::Struct(fields) => {
            let fields = fields
                .iter()
                .map(|(name, shape)| {
                    let ty = realize(reg, shape);
                    StructField::new(name.clone(), ty)
                })
                .collect();
            reg.new_struct_type(None, fields)
        }
    }
}

/// Recomputes a type's register size from first principles.
fn expected_reg_size(reg: &TypeRegistry, id: TypeId) -> u32 {
    let ty = &reg[id];
    match &ty.kind {
        TypeKind::Scalar { .. } | TypeKind::Vector { .. } | TypeKind::Object { .. } => 1,
        TypeKind::Matrix { dimx, dimy, .. } => {
            if ty.is_row_major() {
                *dimy
            } else {
                *dimx
            }
        }
        TypeKind::Array { element, count } => expected_reg_size(reg, *element) * count,
        TypeKind::Struct { fields } => fields
            .iter()
            .map(|field| expected_reg_size(reg, field.ty))
            .sum(),
    }
}

proptest! {
    #[test]
    fn reg_size_matches_recursive_rule(shape in ty_shape()) {
        let mut reg = TypeRegistry::new();
        let id = realize(&mut reg, &shape);
        prop_assert_eq!(reg[id].reg_size, expected_reg_size(&reg, id));
    }

    #[test]
    fn clone_is_idempotent(shape in ty_shape()) {
        let mut reg = TypeRegistry::new();
        let id = realize(&mut reg, &shape);
        let once = reg.clone_with_majority(id, Modifiers::COLUMN_MAJOR);
        let twice = reg.clone_with_majority(once, Modifiers::COLUMN_MAJOR);
        prop_assert!(reg.equal(once, twice));
        prop_assert_eq!(reg[once].reg_size, reg[twice].reg_size);
    }

    #[test]
    fn compare_params_is_antisymmetric(a in ty_shape(), b in ty_shape()) {
        let mut reg = TypeRegistry::new();
        let ta = realize(&mut reg, &a);
        let tb = realize(&mut reg, &b);
        prop_assert_eq!(
            reg.compare_params(ta, tb),
            reg.compare_params(tb, ta).reverse()
        );
    }

    #[test]
    fn equal_types_compare_equal(shape in ty_shape()) {
        let mut reg = TypeRegistry::new();
        let a = realize(&mut reg, &shape);
        let b = realize(&mut reg, &shape);
        prop_assert!(reg.equal(a, b));
        prop_assert_eq!(reg.compare_params(a, b), std::cmp::Ordering::Equal);
    }
}
