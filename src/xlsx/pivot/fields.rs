use smallvec::SmallVec;

use super::order::FieldIndex;

/// Axis a pivot field is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisType {
    AxisRow,
    AxisCol,
    AxisPage,
}

impl AxisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AxisRow => "axisRow",
            Self::AxisCol => "axisCol",
            Self::AxisPage => "axisPage",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "axisRow" => Some(Self::AxisRow),
            "axisCol" => Some(Self::AxisCol),
            "axisPage" => Some(Self::AxisPage),
            _ => None,
        }
    }
}

/// Entry of a pivot field's item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldItem {
    /// Literal shared-item index (`<item x="0"/>`)
    Index(u32),
    /// Default subtotal item (`<item t="default"/>`)
    Default,
}

/// One schema column's axis, display and subtotal metadata.
///
/// `compact`, `outline` and `default_subtotal` are only set on row and column
/// fields; `None` leaves the attribute out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotField {
    pub name: Option<String>,
    pub axis: Option<AxisType>,
    pub data_field: bool,
    pub compact: Option<bool>,
    pub outline: Option<bool>,
    pub default_subtotal: Option<bool>,
    pub items: Vec<FieldItem>,
}

/// Aggregation applied to a data field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subtotal {
    Average,
    Count,
    CountNums,
    Max,
    Min,
    Product,
    StdDev,
    StdDevP,
    #[default]
    Sum,
    Var,
    VarP,
}

impl Subtotal {
    const ALL: [Subtotal; 11] = [
        Self::Average,
        Self::Count,
        Self::CountNums,
        Self::Max,
        Self::Min,
        Self::Product,
        Self::StdDev,
        Self::StdDevP,
        Self::Sum,
        Self::Var,
        Self::VarP,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Count => "count",
            Self::CountNums => "countNums",
            Self::Max => "max",
            Self::Min => "min",
            Self::Product => "product",
            Self::StdDev => "stdDev",
            Self::StdDevP => "stdDevp",
            Self::Sum => "sum",
            Self::Var => "var",
            Self::VarP => "varp",
        }
    }

    /// Exact match on the serialized name.
    pub fn parse_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|subtotal| subtotal.as_str() == s)
    }

    /// Case-insensitive match on a user-supplied name; anything unknown,
    /// including the empty string, aggregates by sum.
    ///
    /// ```
    /// use xlpivot::xlsx::pivot::Subtotal;
    /// assert_eq!(Subtotal::from_name("AVERAGE"), Subtotal::Average);
    /// assert_eq!(Subtotal::from_name("stddevp"), Subtotal::StdDevP);
    /// assert_eq!(Subtotal::from_name("bogus"), Subtotal::Sum);
    /// ```
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|subtotal| subtotal.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }
}

/// Reference from an axis list into the pivot field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisFieldRef {
    /// Position of a source field
    Field(FieldIndex),
    /// The implicit "Σ Values" field grouping several data fields
    Values,
}

impl AxisFieldRef {
    /// Marker written for [`AxisFieldRef::Values`].
    pub const VALUES_INDEX: i32 = -2;

    /// Value of the `x` attribute.
    pub fn x(&self) -> i32 {
        match self {
            Self::Field(index) => index.get() as i32,
            Self::Values => Self::VALUES_INDEX,
        }
    }
}

/// Row or column field list; short in practice.
pub type AxisFieldList = SmallVec<[AxisFieldRef; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageField {
    pub fld: FieldIndex,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataField {
    pub name: Option<String>,
    pub fld: FieldIndex,
    pub subtotal: Subtotal,
}

/// Row or column item of the layout skeleton.
///
/// Each entry in `x` is written as `<x/>` when zero, `<x v=".."/>` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowColItem {
    pub x: SmallVec<[u32; 2]>,
}
