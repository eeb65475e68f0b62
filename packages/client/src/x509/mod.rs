//! X.509 extension and general name model

pub mod attributes;
pub mod bits;
pub mod distribution_point;
pub mod extensions;
pub mod general_name;
pub mod general_names;

pub use attributes::{Attributes, AttributesContent};
pub use distribution_point::{DistributionPoint, DistributionPointName, ReasonFlag};
pub use extensions::{extensions_of, find_extension, ExtensionData, X509ExtensionData};
pub use general_name::{GeneralName, GeneralNameType, OpaqueName};
pub use general_names::GeneralNames;
