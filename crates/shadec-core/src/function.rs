//! Functions and overload sets.
//!
//! The function table is keyed by name. Each entry holds the overloads for
//! that name, ordered by the parameter-type comparator, plus a flag marking
//! compiler intrinsics. Declarations (one per overload) are owned by the
//! context's declaration arena; the table holds their ids. The insertion
//! rules live on [`Context::add_function`](crate::context::Context::add_function),
//! which has access to the arenas the comparator needs.

use indexmap::IndexMap;

use crate::diag::SourceLocation;
use crate::id::{DeclId, FunctionId, VarId};
use crate::node::Block;
use crate::type_id::TypeId;

/// One overload of a function: signature, optional return-value semantic,
/// synthetic return variable (present iff the return type is not void), and
/// a body that stays `None` for forward declarations.
#[derive(Debug)]
pub struct FunctionDecl {
    pub return_type: TypeId,
    /// Parameters in declaration order.
    pub parameters: Vec<VarId>,
    pub semantic: Option<String>,
    pub loc: SourceLocation,
    pub return_var: Option<VarId>,
    pub body: Option<Block>,
    /// Owning function-table entry, set by `add_function`.
    pub func: Option<FunctionId>,
}

/// A named function: its overload set, ordered by the parameter comparator.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub intrinsic: bool,
    pub overloads: Vec<DeclId>,
}

/// The global table of functions, keyed by name, in declaration order.
#[derive(Debug, Default)]
pub struct FunctionTable {
    entries: IndexMap<String, Function>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable::default()
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.entries.get_mut(name)
    }

    /// The table index of `name`, usable as a [`FunctionId`].
    pub fn id_of(&self, name: &str) -> Option<FunctionId> {
        self.entries
            .get_index_of(name)
            .map(|i| FunctionId(i as u32))
    }

    pub fn by_id(&self, id: FunctionId) -> Option<&Function> {
        self.entries.get_index(id.0 as usize).map(|(_, f)| f)
    }

    /// Inserts a new entry and returns its id. The name must be unused.
    pub fn insert(&mut self, func: Function) -> FunctionId {
        let id = FunctionId(self.entries.len() as u32);
        self.entries.insert(func.name.clone(), func);
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Function> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_insert_and_lookup() {
        let mut table = FunctionTable::new();
        let id = table.insert(Function {
            name: "main".into(),
            intrinsic: false,
            overloads: vec![DeclId(0)],
        });
        assert_eq!(id, FunctionId(0));
        assert_eq!(table.id_of("main"), Some(id));
        assert_eq!(table.by_id(id).unwrap().name, "main");
        assert!(table.get("other").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn iteration_is_declaration_ordered() {
        let mut table = FunctionTable::new();
        for name in ["zeta", "alpha", "mid"] {
            table.insert(Function {
                name: name.into(),
                intrinsic: false,
                overloads: vec![],
            });
        }
        let names: Vec<&str> = table.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }
}
