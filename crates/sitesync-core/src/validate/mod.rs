// Pure input checks shared by the loaders and the reconciler.

mod mac;
mod port;
mod prefix;

pub use mac::{MacAddress, MacLayout};
pub use port::{parse_role, parse_security};
pub use prefix::{DeclaredPrefix, same_network};
