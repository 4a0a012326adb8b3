//! Form model: field descriptors, snapshots, and the surface capability the
//! controller reads and writes fields through.

pub mod field;
pub mod snapshot;
pub mod surface;

pub use field::{student_form, FieldDescriptor, FieldKind, FormDescriptor};
pub use snapshot::{FieldValue, FormSnapshot};
pub use surface::{FormState, FormSurface};
