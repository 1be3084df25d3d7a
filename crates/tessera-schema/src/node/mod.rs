mod declaration;
mod model_file;
mod property;

pub use declaration::*;
pub use model_file::*;
pub use property::*;

use crate::error::ErrorTree;

///
/// ValidateNode
///
/// Local, structural checks on a single node. Must not look outside the
/// node; cross-node rules live in `validate`.
///

pub trait ValidateNode {
    fn validate(&self) -> Result<(), ErrorTree> {
        Ok(())
    }
}

///
/// fully_qualified_name
///

#[must_use]
pub fn fully_qualified_name(namespace: &str, name: &str) -> String {
    format!("{namespace}.{name}")
}

/// Split `org.acme.Vehicle` into (`org.acme`, `Vehicle`).
#[must_use]
pub fn split_fully_qualified_name(fqn: &str) -> Option<(&str, &str)> {
    fqn.rsplit_once('.')
        .filter(|(ns, name)| !ns.is_empty() && !name.is_empty())
}
