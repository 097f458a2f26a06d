//! Helpers shared by the package and pivot modules.

pub mod cell_ref;
pub mod xml;

pub use cell_ref::{
    cell_name_to_coordinates, column_index_to_name, column_name_to_index,
    coordinates_to_cell_name,
};
pub use xml::escape_xml;
