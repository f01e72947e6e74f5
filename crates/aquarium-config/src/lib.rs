//! Parametric configuration of an aquarium and its stand.
//!
//! Repositories hold the user-editable scalars declared by the schemas, and
//! the derived `Computed` sheet turns them into the dimensions consumed by
//! the part generators. [`Configuration`] ties both together for one
//! document.

mod computed;
mod configuration;
mod defaults;
mod derived;
mod error;
mod repository;
mod schema;
mod sheet;
mod value;
mod workbook;

pub use computed::{COMPUTED_SHEET, build_computed};
pub use configuration::{AppliedEdit, Configuration, Edit, SettingEntry, SheetEntry, ValueTree};
pub use defaults::{build_standard, standard_schemas};
pub use derived::DerivedSheet;
pub use error::{ConfigError, EditError, SchemaError, SheetError};
pub use repository::{Names, Repository, RepositoryMut};
pub use schema::{
    BooleanConfigValue, Categories, Category, ConfigValue, Editor, NumericConfigValue, Schema,
    SchemaBuilder, SchemaKind, SchemaSet,
};
pub use sheet::{Cell, Row, Sheet};
pub use value::{CellRef, Value};
pub use workbook::{RecomputeStats, Workbook};
