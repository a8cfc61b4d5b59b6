//! Instrument schema registry.
//!
//! Every supported instrument has one immutable [`InstrumentSchema`]: the
//! ordered header fields with their types and group boundaries, the ordered
//! observation fields with their declared shapes, the row layout of the flat
//! form, the block grouping used to rebuild multi-dimensional values, and the
//! file naming parameters.

mod instruments;

use crate::error::{CodecError, Result};
use serde::Serialize;
use std::sync::OnceLock;

/// How a header value is typed in the container form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeaderKind {
    Float,
    Integer,
    Text,
    /// Whitespace separated floats with their own dimension
    FloatArray,
    /// Whitespace separated integers with their own dimension
    IntArray,
}

impl HeaderKind {
    pub fn is_array(&self) -> bool {
        matches!(self, HeaderKind::FloatArray | HeaderKind::IntArray)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeaderField {
    pub code: &'static str,
    pub long_name: &'static str,
    pub unit: &'static str,
    pub kind: HeaderKind,
}

/// Which `file_information` sub-group a header field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeaderGroup {
    Station,
    Instrument,
    Data,
}

impl HeaderGroup {
    pub fn name(&self) -> &'static str {
        match self {
            HeaderGroup::Station => "station",
            HeaderGroup::Instrument => "instrument",
            HeaderGroup::Data => "data",
        }
    }
}

/// Inclusive index ranges partitioning the header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderBoundaries {
    /// Last index of the station group
    pub station_end: usize,
    /// Last index of the instrument group; everything after is the data group
    pub instrument_end: usize,
}

impl HeaderBoundaries {
    pub fn group_of(&self, index: usize) -> HeaderGroup {
        if index <= self.station_end {
            HeaderGroup::Station
        } else if index <= self.instrument_end {
            HeaderGroup::Instrument
        } else {
            HeaderGroup::Data
        }
    }
}

/// How a single observation cell is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    /// `YYYY-MM-DD HH:MM:SS`, always present
    Timestamp,
    /// Timestamp that may be the missing sentinel
    OptionalTimestamp,
    Float,
    /// Quality codes and counts
    Integer,
    Text,
    /// Text code with all whitespace removed
    Code,
}

impl ValueKind {
    pub fn is_timestamp(&self) -> bool {
        matches!(self, ValueKind::Timestamp | ValueKind::OptionalTimestamp)
    }
}

/// Declared shape of one observation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldShape {
    Scalar,
    Vector(usize),
    /// Rows x columns, in the order cells arrive in the flat form
    Matrix(usize, usize),
}

impl FieldShape {
    /// Number of cells a value of this shape occupies.
    pub fn cells(&self) -> usize {
        match self {
            FieldShape::Scalar => 1,
            FieldShape::Vector(n) => *n,
            FieldShape::Matrix(r, c) => r * c,
        }
    }

    pub fn dims(&self) -> Vec<usize> {
        match self {
            FieldShape::Scalar => Vec::new(),
            FieldShape::Vector(n) => vec![*n],
            FieldShape::Matrix(r, c) => vec![*r, *c],
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, FieldShape::Scalar)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObsField {
    pub code: &'static str,
    pub long_name: &'static str,
    pub unit: &'static str,
    pub kind: ValueKind,
    pub shape: FieldShape,
    /// Container dimension names for the non-time axes, in container order
    pub axes: &'static [&'static str],
    /// Swap the two matrix axes before stacking into the container
    pub transpose: bool,
    /// Datastore documents hold this vector as `<prefix>0..<prefix>N-1` scalar keys
    pub scattered_prefix: Option<&'static str>,
}

impl ObsField {
    pub const fn scalar(
        code: &'static str,
        long_name: &'static str,
        unit: &'static str,
        kind: ValueKind,
    ) -> Self {
        Self {
            code,
            long_name,
            unit,
            kind,
            shape: FieldShape::Scalar,
            axes: &[],
            transpose: false,
            scattered_prefix: None,
        }
    }

    pub const fn array(
        code: &'static str,
        long_name: &'static str,
        unit: &'static str,
        kind: ValueKind,
        shape: FieldShape,
        axes: &'static [&'static str],
    ) -> Self {
        Self {
            code,
            long_name,
            unit,
            kind,
            shape,
            axes,
            transpose: false,
            scattered_prefix: None,
        }
    }

    pub const fn transposed(mut self) -> Self {
        self.transpose = true;
        self
    }

    pub const fn scattered(mut self, prefix: &'static str) -> Self {
        self.scattered_prefix = Some(prefix);
        self
    }

    /// Shape as stored in the container (after any transposition).
    pub fn container_dims(&self) -> Vec<usize> {
        match (self.shape, self.transpose) {
            (FieldShape::Matrix(r, c), true) => vec![c, r],
            (shape, _) => shape.dims(),
        }
    }
}

/// Flat-form row layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowLayout {
    /// Code row, then one row per record; empty codes continue the previous block
    Columnar,
    /// Code row, then independent column groups of unequal length
    SubSeries,
    /// No code row; column 0 is the field tag, empty tag continues a matrix
    Tagged,
}

/// One column of a sub-series: output code and the record field it reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesColumn {
    pub code: &'static str,
    pub source: &'static str,
    pub long_name: &'static str,
    pub unit: &'static str,
    pub kind: ValueKind,
}

/// An independent time axis carved out of the record stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubSeries {
    /// Name of the time dimension and its timestamp variable
    pub dimension: &'static str,
    pub long_name: &'static str,
    /// A record belongs to the series when any of these fields is not missing
    pub filter: &'static [&'static str],
    pub columns: &'static [SeriesColumn],
}

/// How multi-dimensional values are rebuilt for an instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BlockGrouping {
    /// Every field is a scalar
    None,
    /// One fixed-length vector family per record
    FixedVector,
    /// A single matrix family per record
    Matrix,
    /// Several vector or matrix families sharing axes
    MultiAxis,
    /// Independent time axes (precipitation gauge)
    SubSeries(Vec<SubSeries>),
}

impl BlockGrouping {
    pub fn label(&self) -> &'static str {
        match self {
            BlockGrouping::None => "none",
            BlockGrouping::FixedVector => "fixed-vector",
            BlockGrouping::Matrix => "matrix",
            BlockGrouping::MultiAxis => "multi-axis",
            BlockGrouping::SubSeries(_) => "sub-series",
        }
    }
}

/// A field whose cells are accumulated across columns or rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFamily {
    pub code: &'static str,
    /// Next field of the schema; closes the block
    pub terminator: &'static str,
    pub shape: FieldShape,
}

/// Parameters of the output file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileNaming {
    pub class01: &'static str,
    pub class03: &'static str,
    pub class04: &'static str,
    pub station: &'static str,
    pub data_code: &'static str,
    pub manufacturer: &'static str,
    pub level: &'static str,
    pub quality_controlled: bool,
}

/// Header rewrites applied to every batch before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeaderOverride {
    /// Always write `value` into `code`
    Fixed {
        code: &'static str,
        value: &'static str,
    },
    /// Write `value` into `code` when two consecutive records are at most
    /// `max_gap_secs` apart
    FastCadence {
        code: &'static str,
        max_gap_secs: i64,
        value: &'static str,
    },
}

/// Immutable per-instrument definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentSchema {
    pub id: &'static str,
    pub description: &'static str,
    pub header_fields: Vec<HeaderField>,
    pub boundaries: HeaderBoundaries,
    pub obs_fields: Vec<ObsField>,
    pub primary_timestamp: &'static str,
    pub layout: RowLayout,
    pub grouping: BlockGrouping,
    pub naming: FileNaming,
    pub overrides: Vec<HeaderOverride>,
}

impl InstrumentSchema {
    pub fn header_codes(&self) -> Vec<&'static str> {
        self.header_fields.iter().map(|f| f.code).collect()
    }

    pub fn header_index(&self, code: &str) -> Option<usize> {
        self.header_fields.iter().position(|f| f.code == code)
    }

    pub fn obs_codes(&self) -> Vec<&'static str> {
        self.obs_fields.iter().map(|f| f.code).collect()
    }

    pub fn obs_field(&self, code: &str) -> Option<&ObsField> {
        self.obs_fields.iter().find(|f| f.code == code)
    }

    /// Code of the container time dimension: the first observation field.
    pub fn time_dimension(&self) -> &'static str {
        self.obs_fields.first().map(|f| f.code).unwrap_or(self.primary_timestamp)
    }

    pub fn sub_series(&self) -> &[SubSeries] {
        match &self.grouping {
            BlockGrouping::SubSeries(series) => series,
            _ => &[],
        }
    }

    /// Fields whose cells are grouped into blocks in the flat form.
    ///
    /// Column layouts group every non-scalar field; the tagged layout writes
    /// vectors on one row and only groups matrices.
    pub fn block_families(&self) -> Vec<BlockFamily> {
        let mut families = Vec::new();
        for (i, field) in self.obs_fields.iter().enumerate() {
            let grouped = match self.layout {
                RowLayout::Columnar => !field.shape.is_scalar(),
                RowLayout::Tagged => matches!(field.shape, FieldShape::Matrix(..)),
                RowLayout::SubSeries => false,
            };
            if !grouped {
                continue;
            }
            if let Some(next) = self.obs_fields.get(i + 1) {
                families.push(BlockFamily {
                    code: field.code,
                    terminator: next.code,
                    shape: field.shape,
                });
            }
        }
        families
    }

    /// Column codes written in the flat form's code row.
    pub fn flat_code_row(&self) -> Vec<&'static str> {
        match self.layout {
            RowLayout::Columnar => {
                let mut codes = Vec::new();
                for field in &self.obs_fields {
                    codes.push(field.code);
                    codes.extend(std::iter::repeat_n("", field.shape.cells() - 1));
                }
                codes
            }
            RowLayout::SubSeries => self
                .sub_series()
                .iter()
                .flat_map(|s| std::iter::once(s.dimension).chain(s.columns.iter().map(|c| c.code)))
                .collect(),
            RowLayout::Tagged => Vec::new(),
        }
    }
}

fn registry() -> &'static [InstrumentSchema] {
    static REGISTRY: OnceLock<Vec<InstrumentSchema>> = OnceLock::new();
    REGISTRY.get_or_init(instruments::all)
}

/// Look up the schema of an instrument by id.
pub fn lookup(instrument_id: &str) -> Result<&'static InstrumentSchema> {
    registry()
        .iter()
        .find(|s| s.id == instrument_id)
        .ok_or_else(|| CodecError::UnknownInstrument {
            id: instrument_id.to_string(),
        })
}

/// All registered schemas in registry order.
pub fn all() -> &'static [InstrumentSchema] {
    registry()
}

pub fn instrument_ids() -> Vec<&'static str> {
    registry().iter().map(|s| s.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_twelve_instruments() {
        let ids = instrument_ids();
        assert_eq!(ids.len(), 12);
        for id in [
            "AWS", "AERM", "VIS", "YCCL_L3", "YCCL_L2", "RSD", "MRD", "FSD", "PRE", "RRD_Lraw",
            "RRD_Lpro", "RRD_Lave",
        ] {
            assert!(ids.contains(&id), "missing {}", id);
        }
    }

    #[test]
    fn test_unknown_instrument() {
        let err = lookup("SODAR").unwrap_err();
        assert!(matches!(err, CodecError::UnknownInstrument { ref id } if id == "SODAR"));
    }

    #[test]
    fn test_header_layout_invariants() {
        for schema in all() {
            let codes = schema.header_codes();
            let n = codes.len();
            assert_eq!(codes[0], "Station_name", "{}", schema.id);
            assert_eq!(codes[11], "Admi_code_CHN", "{}", schema.id);
            assert_eq!(codes[n - 4], "Obse_begi_DT", "{}", schema.id);
            assert_eq!(codes[n - 3], "Obse_end_DT", "{}", schema.id);
            assert_eq!(codes[n - 2], "Data_crea_DT", "{}", schema.id);
            assert_eq!(codes[n - 1], "Dataset_version", "{}", schema.id);
            assert_eq!(schema.boundaries.station_end, 11);
            assert!(schema.boundaries.instrument_end < n - 4);
        }
    }

    #[test]
    fn test_instrument_group_boundaries() {
        assert_eq!(lookup("AWS").unwrap().boundaries.instrument_end, 17);
        assert_eq!(lookup("VIS").unwrap().boundaries.instrument_end, 15);
        assert_eq!(lookup("RRD_Lraw").unwrap().boundaries.instrument_end, 19);
        assert_eq!(lookup("RRD_Lave").unwrap().boundaries.instrument_end, 18);
        let b = lookup("FSD").unwrap().boundaries;
        assert_eq!(b.group_of(3), HeaderGroup::Station);
        assert_eq!(b.group_of(14), HeaderGroup::Instrument);
        assert_eq!(b.group_of(16), HeaderGroup::Data);
    }

    #[test]
    fn test_primary_timestamps() {
        for schema in all() {
            let expected = if schema.id == "MRD" { "Datetime_301" } else { "Datetime" };
            assert_eq!(schema.primary_timestamp, expected);
            assert_eq!(schema.time_dimension(), expected);
            assert!(schema.obs_field(expected).is_some());
        }
    }

    #[test]
    fn test_block_families() {
        let rsd = lookup("RSD").unwrap().block_families();
        assert_eq!(rsd.len(), 1);
        assert_eq!(rsd[0].code, "Prec_spec");
        assert_eq!(rsd[0].terminator, "Q_data");
        assert_eq!(rsd[0].shape, FieldShape::Matrix(22, 20));

        let mrd = lookup("MRD").unwrap().block_families();
        let pairs: Vec<_> = mrd.iter().map(|f| (f.code, f.terminator)).collect();
        assert_eq!(
            pairs,
            vec![
                ("Temp_prof", "Datetime_402"),
                ("VAP_prof", "Datetime_403"),
                ("LWC_prof", "Datetime_404"),
                ("RH_prof", "Q_Temp_ambi"),
            ]
        );

        let yccl = lookup("YCCL_L2").unwrap().block_families();
        assert_eq!(yccl[0].terminator, "Q_BS_prof");
        assert_eq!(yccl[0].shape.cells(), 450);

        let fsd = lookup("FSD").unwrap().block_families();
        assert_eq!((fsd[0].code, fsd[0].terminator), ("Numb_part_chan", "Numb_conc"));

        let lpro = lookup("RRD_Lpro").unwrap().block_families();
        let codes: Vec<_> = lpro.iter().map(|f| f.code).collect();
        assert_eq!(codes, vec!["Spectral_reflectivities", "Drop_size", "Spec_drop_dens"]);
        assert!(lpro.iter().all(|f| f.shape == FieldShape::Matrix(64, 31)));

        let lraw = lookup("RRD_Lraw").unwrap().block_families();
        assert_eq!(lraw[0].shape, FieldShape::Matrix(64, 32));
        assert!(lookup("AWS").unwrap().block_families().is_empty());
    }

    #[test]
    fn test_flat_code_row_widths() {
        let rsd = lookup("RSD").unwrap();
        let row = rsd.flat_code_row();
        let start = row.iter().position(|c| *c == "Prec_spec").unwrap();
        assert_eq!(row[start + 440], "Q_data");
        assert!(row[start + 1..start + 440].iter().all(|c| c.is_empty()));

        let pre = lookup("PRE").unwrap();
        assert_eq!(
            pre.flat_code_row(),
            vec![
                "Datetime_Temp",
                "Temp",
                "Q_Temp",
                "Datetime_Prec",
                "Prec",
                "Q_Prec",
                "Datetime_oclock",
                "Temp_MAX",
                "Prec_cumu",
                "Q_Temp_MAX",
                "Q_Prec_cumu",
            ]
        );
    }

    #[test]
    fn test_transposed_container_dims() {
        let lave = lookup("RRD_Lave").unwrap();
        let field = lave.obs_field("Spec_drop_dens").unwrap();
        assert_eq!(field.container_dims(), vec![31, 64]);
        assert_eq!(field.axes, &["Dime_HGT_31", "Dime_part_diam_clas"]);
    }
}
