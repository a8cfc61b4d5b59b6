//! Hierarchical container encoding.
//!
//! A container mirrors a netCDF-4 file: the root holds
//! `file_information/{station,instrument,data}` with the typed header values
//! and `observational_information` with one variable per observation field,
//! stacked along the batch's time dimension.

use super::{prepare_header_at, series_members};
use crate::decoder::is_missing_token;
use crate::error::{CodecError, Result};
use crate::models::{DayBatch, HeaderRecord, MISSING_SENTINEL, TIMESTAMP_FORMAT, Value};
use crate::schema::{
    HeaderGroup, HeaderKind, InstrumentSchema, ObsField, SubSeries, ValueKind,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Stored in integer variables where a value is missing.
pub const INT_FILL_VALUE: i64 = -999_999;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum VariableData {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

impl VariableData {
    pub fn len(&self) -> usize {
        match self {
            VariableData::Float(v) => v.len(),
            VariableData::Int(v) => v.len(),
            VariableData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub dimensions: Vec<String>,
    pub long_name: String,
    pub units: String,
    pub data: VariableData,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Group {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<Variable>,
    pub groups: Vec<Group>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Length of `name`, searching this group only.
    pub fn dimension_len(&self, name: &str) -> Option<usize> {
        self.dimension(name).map(|d| d.len)
    }

    fn add_dimension(&mut self, name: &str, len: usize) -> Result<()> {
        match self.dimension(name) {
            Some(existing) if existing.len != len => Err(CodecError::malformed_block(
                "",
                name,
                format!("dimension declared with lengths {} and {}", existing.len, len),
            )),
            Some(_) => Ok(()),
            None => {
                self.dimensions.push(Dimension {
                    name: name.to_string(),
                    len,
                });
                Ok(())
            }
        }
    }
}

/// Root of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    pub root: Group,
}

impl Container {
    /// Look up a group by slash separated path, e.g. `file_information/station`.
    pub fn group(&self, path: &str) -> Option<&Group> {
        path.split('/')
            .filter(|p| !p.is_empty())
            .try_fold(&self.root, |group, name| group.group(name))
    }

    /// Check every variable's value count against its dimensions.
    pub fn validate(&self) -> Result<()> {
        fn check(group: &Group, inherited: &[&Dimension]) -> Result<()> {
            let mut visible: Vec<&Dimension> = inherited.to_vec();
            visible.extend(group.dimensions.iter());
            for var in &group.variables {
                let mut expected = 1usize;
                for dim in &var.dimensions {
                    let len = visible
                        .iter()
                        .rev()
                        .find(|d| &d.name == dim)
                        .map(|d| d.len)
                        .ok_or_else(|| {
                            CodecError::malformed_block("", var.name.as_str(), format!("unknown dimension {}", dim))
                        })?;
                    expected *= len;
                }
                if var.data.len() != expected {
                    return Err(CodecError::malformed_block(
                        "",
                        var.name.as_str(),
                        format!("{} values for dimensions {:?}", var.data.len(), var.dimensions),
                    ));
                }
            }
            for child in &group.groups {
                check(child, &visible)?;
            }
            Ok(())
        }
        check(&self.root, &[])
    }
}

fn header_variable(group: &mut Group, code: &str, long_name: &str, unit: &str, kind: HeaderKind, raw: &str) -> Result<()> {
    let raw = raw.trim();
    let (dimensions, data) = match kind {
        HeaderKind::Text => (Vec::new(), VariableData::Text(vec![raw.to_string()])),
        HeaderKind::Float => (Vec::new(), VariableData::Float(vec![header_float(code, raw)?])),
        HeaderKind::Integer => (Vec::new(), VariableData::Int(vec![header_int(code, raw)?])),
        HeaderKind::FloatArray | HeaderKind::IntArray => {
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            let tokens = if tokens.is_empty() { vec![""] } else { tokens };
            // The array's dimension shares the header code's name
            group.add_dimension(code, tokens.len())?;
            let data = if kind == HeaderKind::IntArray {
                VariableData::Int(tokens.iter().map(|t| header_int(code, t)).collect::<Result<_>>()?)
            } else {
                VariableData::Float(tokens.iter().map(|t| header_float(code, t)).collect::<Result<_>>()?)
            };
            (vec![code.to_string()], data)
        }
    };
    group.variables.push(Variable {
        name: code.to_string(),
        dimensions,
        long_name: long_name.to_string(),
        units: unit.to_string(),
        data,
    });
    Ok(())
}

fn is_unset(raw: &str) -> bool {
    raw.is_empty() || is_missing_token(raw)
}

/// Header float; blank or missing tokens become NaN, anything else must parse.
fn header_float(code: &str, raw: &str) -> Result<f64> {
    if is_unset(raw) {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>()
        .map_err(|e| CodecError::invalid_value(code, raw, e.to_string()))
}

/// Header integer; whole-valued floats are accepted, unset values become the fill value.
fn header_int(code: &str, raw: &str) -> Result<i64> {
    if is_unset(raw) {
        return Ok(INT_FILL_VALUE);
    }
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.round() as i64))
        .ok_or_else(|| CodecError::invalid_value(code, raw, "expected an integer"))
}

fn file_information(schema: &InstrumentSchema, header: &HeaderRecord) -> Result<Group> {
    let mut groups = [
        Group::new(HeaderGroup::Station.name()),
        Group::new(HeaderGroup::Instrument.name()),
        Group::new(HeaderGroup::Data.name()),
    ];
    for (i, field) in schema.header_fields.iter().enumerate() {
        let slot = match schema.boundaries.group_of(i) {
            HeaderGroup::Station => 0,
            HeaderGroup::Instrument => 1,
            HeaderGroup::Data => 2,
        };
        let raw = header.get(i).unwrap_or("");
        header_variable(&mut groups[slot], field.code, field.long_name, field.unit, field.kind, raw)?;
    }
    let mut info = Group::new("file_information");
    info.groups.extend(groups);
    Ok(info)
}

fn number_of(code: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Missing => Ok(f64::NAN),
        Value::Number(n) => Ok(*n),
        other => Err(CodecError::invalid_value(code, other.to_string(), "expected a number")),
    }
}

fn int_of(code: &str, value: &Value) -> Result<i64> {
    let n = number_of(code, value)?;
    Ok(if n.is_finite() { n.round() as i64 } else { INT_FILL_VALUE })
}

fn text_of(code: &str, kind: ValueKind, value: &Value) -> Result<String> {
    match (kind, value) {
        (_, Value::Missing) => Ok(MISSING_SENTINEL.to_string()),
        (_, Value::Timestamp(ts)) => Ok(ts.format(TIMESTAMP_FORMAT).to_string()),
        (ValueKind::Text | ValueKind::Code, Value::Text(s)) => Ok(s.clone()),
        (_, other) => Err(CodecError::invalid_value(code, other.to_string(), "expected text or a timestamp")),
    }
}

/// Column of scalar values as a container variable.
fn scalar_data<'a>(
    code: &str,
    kind: ValueKind,
    values: impl Iterator<Item = &'a Value>,
) -> Result<VariableData> {
    Ok(match kind {
        ValueKind::Float => VariableData::Float(values.map(|v| number_of(code, v)).collect::<Result<_>>()?),
        ValueKind::Integer => VariableData::Int(values.map(|v| int_of(code, v)).collect::<Result<_>>()?),
        ValueKind::Timestamp | ValueKind::OptionalTimestamp | ValueKind::Text | ValueKind::Code => {
            VariableData::Text(values.map(|v| text_of(code, kind, v)).collect::<Result<_>>()?)
        }
    })
}

/// Per-record arrays stacked along the time axis, transposed when flagged.
fn array_data(field: &ObsField, batch: &DayBatch) -> Result<VariableData> {
    let declared = field.shape.dims();
    let cells = field.shape.cells();
    let mut stacked = Vec::with_capacity(cells * batch.len());
    for record in batch.records() {
        match record.get(field.code) {
            Some(Value::Array(array)) => {
                if array.shape() != declared.as_slice() {
                    return Err(CodecError::malformed_block(
                        "",
                        field.code,
                        format!("shape {:?}, declared {:?}", array.shape(), declared),
                    ));
                }
                if field.transpose {
                    stacked.extend_from_slice(array.transposed().data());
                } else {
                    stacked.extend_from_slice(array.data());
                }
            }
            Some(Value::Missing) | None => stacked.extend(std::iter::repeat_n(f64::NAN, cells)),
            Some(other) => {
                return Err(CodecError::invalid_value(field.code, other.to_string(), "expected an array"));
            }
        }
    }
    Ok(match field.kind {
        ValueKind::Integer => VariableData::Int(
            stacked
                .into_iter()
                .map(|v| if v.is_finite() { v.round() as i64 } else { INT_FILL_VALUE })
                .collect(),
        ),
        _ => VariableData::Float(stacked),
    })
}

fn missing_value() -> &'static Value {
    static MISSING: Value = Value::Missing;
    &MISSING
}

fn sub_series_variables(
    group: &mut Group,
    series: &SubSeries,
    primary: &str,
    batch: &DayBatch,
) -> Result<()> {
    let members = series_members(series, batch);
    if members.is_empty() {
        debug!("Sub-series {} is empty, omitted", series.dimension);
        return Ok(());
    }

    group.add_dimension(series.dimension, members.len())?;
    let dims = vec![series.dimension.to_string()];
    group.variables.push(Variable {
        name: series.dimension.to_string(),
        dimensions: dims.clone(),
        long_name: series.long_name.to_string(),
        units: "yyyy-mm-dd hh:mm:ss".to_string(),
        data: scalar_data(
            series.dimension,
            ValueKind::Timestamp,
            members.iter().map(|r| r.get(primary).unwrap_or(missing_value())),
        )?,
    });
    for column in series.columns {
        group.variables.push(Variable {
            name: column.code.to_string(),
            dimensions: dims.clone(),
            long_name: column.long_name.to_string(),
            units: column.unit.to_string(),
            data: scalar_data(
                column.code,
                column.kind,
                members.iter().map(|r| r.get(column.source).unwrap_or(missing_value())),
            )?,
        });
    }
    Ok(())
}

fn observational_information(schema: &InstrumentSchema, batch: &DayBatch) -> Result<Group> {
    let mut group = Group::new("observational_information");
    let time_dim = schema.time_dimension();
    group.add_dimension(time_dim, batch.len())?;

    let series = schema.sub_series();
    if !series.is_empty() {
        // Only the time axis is shared; everything else lives on the sub-series axes
        let field = schema.obs_field(time_dim);
        group.variables.push(Variable {
            name: time_dim.to_string(),
            dimensions: vec![time_dim.to_string()],
            long_name: field.map(|f| f.long_name).unwrap_or(time_dim).to_string(),
            units: field.map(|f| f.unit).unwrap_or("-").to_string(),
            data: scalar_data(
                time_dim,
                ValueKind::Timestamp,
                batch.records().iter().map(|r| r.get(time_dim).unwrap_or(missing_value())),
            )?,
        });
        for s in series {
            sub_series_variables(&mut group, s, schema.primary_timestamp, batch)?;
        }
        return Ok(group);
    }

    for field in &schema.obs_fields {
        let mut dimensions = vec![time_dim.to_string()];
        let data = if field.shape.is_scalar() {
            scalar_data(
                field.code,
                field.kind,
                batch.records().iter().map(|r| r.get(field.code).unwrap_or(missing_value())),
            )?
        } else {
            for (axis, len) in field.axes.iter().zip(field.container_dims()) {
                group.add_dimension(axis, len)?;
                dimensions.push(axis.to_string());
            }
            array_data(field, batch)?
        };
        group.variables.push(Variable {
            name: field.code.to_string(),
            dimensions,
            long_name: field.long_name.to_string(),
            units: field.unit.to_string(),
            data,
        });
    }
    Ok(group)
}

/// Encode `batch` with a fixed creation time.
pub fn encode_container_at(
    schema: &InstrumentSchema,
    header: &HeaderRecord,
    batch: &DayBatch,
    created: NaiveDateTime,
) -> Result<Container> {
    let header = prepare_header_at(schema, header, batch, created)?;
    let mut root = Group::new("/");
    root.attributes.insert("instrument".to_string(), schema.id.to_string());
    root.attributes.insert("description".to_string(), schema.description.to_string());
    root.groups.push(file_information(schema, &header)?);
    root.groups.push(observational_information(schema, batch)?);

    let container = Container { root };
    container.validate().map_err(|e| e.with_source(schema.id))?;
    debug!("{}: container for {} with {} records", schema.id, batch.date(), batch.len());
    Ok(container)
}

pub fn encode_container(
    schema: &InstrumentSchema,
    header: &HeaderRecord,
    batch: &DayBatch,
) -> Result<Container> {
    encode_container_at(schema, header, batch, super::creation_time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NdArray, ObservationRecord};
    use crate::schema::lookup;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn header(schema: &InstrumentSchema) -> HeaderRecord {
        let values = schema
            .header_fields
            .iter()
            .map(|f| match f.kind {
                HeaderKind::Float => "1.5".to_string(),
                HeaderKind::Integer => "60".to_string(),
                HeaderKind::FloatArray => "0.1 0.2 0.3".to_string(),
                HeaderKind::IntArray => "1 2 3 4".to_string(),
                HeaderKind::Text => f.code.to_string(),
            })
            .collect();
        HeaderRecord::new(values)
    }

    fn batch_of(records: Vec<ObservationRecord>, primary: &str) -> DayBatch {
        let mut iter = records.into_iter();
        let first = iter.next().unwrap();
        let date = first.timestamp(primary).unwrap().date();
        let mut batch = DayBatch::new(date, primary, first);
        iter.for_each(|r| batch.push(r));
        batch
    }

    #[test]
    fn test_header_groups_and_types() {
        let schema = lookup("RSD").unwrap();
        let spec = NdArray::new(vec![22, 20], (0..440).map(f64::from).collect()).unwrap();
        let record = ObservationRecord::new()
            .with("Datetime", Value::Timestamp(ts("2024-05-01 00:00:00")))
            .with("Syno_4678_1MIN", Value::Text("RA".to_string()))
            .with("Syno_4678_5MIN", Value::Missing)
            .with("Prec_inte", Value::Number(0.5))
            .with("Prec_cumu", Value::Number(1.0))
            .with("Rada_refl", Value::Missing)
            .with("MOR_VIS", Value::Number(8000.0))
            .with("Numb_part", Value::Number(12.0))
            .with("Prec_spec", Value::Array(spec))
            .with("Q_data", Value::Number(0.0));
        let batch = batch_of(vec![record], "Datetime");
        let container = encode_container_at(schema, &header(schema), &batch, ts("2024-05-02 00:00:00")).unwrap();

        let station = container.group("file_information/station").unwrap();
        assert_eq!(station.variable("LAT").unwrap().data, VariableData::Float(vec![1.5]));
        let data = container.group("file_information/data").unwrap();
        assert_eq!(data.dimension_len("Part_diam_clas"), Some(3));
        assert_eq!(
            data.variable("Part_diam_clas").unwrap().dimensions,
            vec!["Part_diam_clas"]
        );
        assert_eq!(
            data.variable("Obse_begi_DT").unwrap().data,
            VariableData::Text(vec!["2024-05-01 00:00:00".to_string()])
        );

        let obs = container.group("observational_information").unwrap();
        assert_eq!(obs.dimension_len("Datetime"), Some(1));
        assert_eq!(obs.dimension_len("Dime_numb_part_diam_clas"), Some(22));
        assert_eq!(obs.dimension_len("Dime_numb_part_velo_clas"), Some(20));
        let spec = obs.variable("Prec_spec").unwrap();
        assert_eq!(spec.dimensions, vec!["Datetime", "Dime_numb_part_diam_clas", "Dime_numb_part_velo_clas"]);
        assert_eq!(spec.data.len(), 440);
        match &obs.variable("Rada_refl").unwrap().data {
            VariableData::Float(values) => assert!(values[0].is_nan()),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            obs.variable("Syno_4678_5MIN").unwrap().data,
            VariableData::Text(vec!["Nan".to_string()])
        );
    }

    #[test]
    fn test_wrong_array_shape_rejected() {
        let schema = lookup("FSD").unwrap();
        let record = ObservationRecord::new()
            .with("Datetime", Value::Timestamp(ts("2024-05-01 00:00:00")))
            .with("Numb_part_chan", Value::Array(NdArray::vector(vec![1.0; 19])))
            .with("Numb_conc", Value::Number(1.0))
            .with("Volu_conc", Value::Number(1.0))
            .with("LWC", Value::Number(1.0))
            .with("MVD", Value::Number(1.0))
            .with("Q_data", Value::Number(0.0));
        let batch = batch_of(vec![record], "Datetime");
        let err = encode_container(schema, &header(schema), &batch).unwrap_err();
        assert!(matches!(err, CodecError::MalformedBlock { ref field, .. } if field == "Numb_part_chan"));
    }

    #[test]
    fn test_malformed_header_number_rejected() {
        let mut group = Group::new("station");
        let err = header_variable(&mut group, "LAT", "Latitude", "degree", HeaderKind::Float, "abc").unwrap_err();
        assert!(matches!(err, CodecError::InvalidValue { ref field, .. } if field == "LAT"));

        let err = header_variable(&mut group, "Size_each_bin", "Bins", "um", HeaderKind::IntArray, "2 x 5")
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidValue { ref value, .. } if value == "x"));

        let schema = lookup("VIS").unwrap();
        let mut values = header(schema).values().to_vec();
        let lat = schema.header_index("LAT").unwrap();
        values[lat] = "north".to_string();
        let record = ObservationRecord::new()
            .with("Datetime", Value::Timestamp(ts("2024-05-01 00:00:00")))
            .with("VIS_1MIN", Value::Number(1.0))
            .with("Q_VIS_1MIN", Value::Number(0.0))
            .with("VIS_10MIN", Value::Number(1.0))
            .with("Q_VIS_10MIN", Value::Number(0.0));
        let batch = batch_of(vec![record], "Datetime");
        assert!(encode_container(schema, &HeaderRecord::new(values), &batch).is_err());
    }

    #[test]
    fn test_unset_header_numbers_use_fill_values() {
        let mut group = Group::new("instrument");
        header_variable(&mut group, "ALT", "Altitude", "m", HeaderKind::Float, "Nan").unwrap();
        header_variable(&mut group, "Time_AVG", "Averaging time", "s", HeaderKind::Integer, "").unwrap();
        header_variable(&mut group, "Time_resolution", "Time resolution", "s", HeaderKind::Integer, "60.0").unwrap();
        header_variable(&mut group, "HGT", "Height levels", "m", HeaderKind::FloatArray, "").unwrap();

        match &group.variable("ALT").unwrap().data {
            VariableData::Float(values) => assert!(values[0].is_nan()),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(group.variable("Time_AVG").unwrap().data, VariableData::Int(vec![INT_FILL_VALUE]));
        assert_eq!(group.variable("Time_resolution").unwrap().data, VariableData::Int(vec![60]));
        assert_eq!(group.dimension_len("HGT"), Some(1));
    }

    #[test]
    fn test_pre_empty_sub_series_omitted() {
        let schema = lookup("PRE").unwrap();
        let records = (0..3)
            .map(|i| {
                crate::decoder::blank_record(schema, ts(&format!("2024-06-01 00:0{}:00", i)))
                    .with("TEM", Value::Number(20.0 + i as f64))
                    .with("Q_TEM", Value::Number(0.0))
            })
            .collect();
        let batch = batch_of(records, "Datetime");
        let container = encode_container_at(schema, &header(schema), &batch, ts("2024-06-02 00:00:00")).unwrap();

        let obs = container.group("observational_information").unwrap();
        assert_eq!(obs.dimension_len("Datetime"), Some(3));
        assert_eq!(obs.dimension_len("Datetime_Temp"), Some(3));
        assert_eq!(obs.variable("Temp").unwrap().data, VariableData::Float(vec![20.0, 21.0, 22.0]));
        for absent in ["Datetime_Prec", "Datetime_oclock"] {
            assert!(obs.dimension(absent).is_none(), "{}", absent);
            assert!(obs.variable(absent).is_none(), "{}", absent);
        }
        assert!(obs.variable("Prec").is_none());
        assert!(obs.variable("Temp_MAX").is_none());
    }
}
