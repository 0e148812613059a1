//! Where an item is visible.
//!
//! Pages are only ever reachable through their own route. Fragments and
//! assets are local to their directory unless they sit at the template root,
//! or the pond promotes everything, in which case every page sees them.

use crate::item::Kind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Visible to pages in the same directory.
    Local,
    /// Visible to every page in the pond.
    Global,
}

impl Scope {
    pub fn resolve(kind: &Kind, at_root: bool, promote_all: bool) -> Scope {
        match kind {
            Kind::Page => Scope::Local,
            Kind::System { .. } => Scope::Global,
            Kind::Fragment | Kind::StyleOrScript(_) | Kind::Media if at_root || promote_all => Scope::Global,
            Kind::Fragment | Kind::StyleOrScript(_) | Kind::Media => Scope::Local,
        }
    }
}
