//! Persisting encoded outputs.
//!
//! Every write goes to a temporary file in the target directory and is then
//! renamed into place, so a failed write never leaves a partial file at the
//! target path.

use super::container::Container;
use crate::error::{CodecError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Write `bytes` to `path` through a temp file and atomic rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| CodecError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Destination for encoded containers.
pub trait ContainerSink {
    /// File extension of the written files, without the dot.
    fn extension(&self) -> &'static str;

    fn write(&self, container: &Container, path: &Path) -> Result<()>;
}

/// Writes the container tree as pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonContainerSink;

impl ContainerSink for JsonContainerSink {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write(&self, container: &Container, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(container)?;
        write_atomic(path, &bytes)
    }
}

#[cfg(feature = "netcdf")]
pub use self::netcdf_sink::NetCdfSink;

#[cfg(feature = "netcdf")]
mod netcdf_sink {
    use super::{ContainerSink, Path};
    use crate::encoder::container::{Container, Group, INT_FILL_VALUE, VariableData};
    use crate::error::{CodecError, Result};
    use tempfile::Builder;

    /// Writes a netCDF-4 file with one netCDF group per container group.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct NetCdfSink;

    fn put_group(target: &mut netcdf::GroupMut<'_>, group: &Group) -> Result<()> {
        for (name, value) in &group.attributes {
            target.add_attribute(name, value.as_str())?;
        }
        for dim in &group.dimensions {
            target.add_dimension(&dim.name, dim.len)?;
        }
        for var in &group.variables {
            let dims: Vec<&str> = var.dimensions.iter().map(String::as_str).collect();
            match &var.data {
                VariableData::Float(values) => {
                    let mut v = target.add_variable::<f64>(&var.name, &dims)?;
                    v.set_fill_value(f64::NAN)?;
                    v.put_values(values, ..)?;
                    v.put_attribute("long_name", var.long_name.as_str())?;
                    v.put_attribute("units", var.units.as_str())?;
                }
                VariableData::Int(values) => {
                    let mut v = target.add_variable::<i64>(&var.name, &dims)?;
                    v.set_fill_value(INT_FILL_VALUE)?;
                    v.put_values(values, ..)?;
                    v.put_attribute("long_name", var.long_name.as_str())?;
                    v.put_attribute("units", var.units.as_str())?;
                }
                VariableData::Text(values) => {
                    let mut v = target.add_string_variable(&var.name, &dims)?;
                    if dims.is_empty() {
                        if let Some(first) = values.first() {
                            v.put_string(first, ..)?;
                        }
                    } else {
                        for (i, s) in values.iter().enumerate() {
                            v.put_string(s, [i])?;
                        }
                    }
                    v.put_attribute("long_name", var.long_name.as_str())?;
                    v.put_attribute("units", var.units.as_str())?;
                }
            }
        }
        for child in &group.groups {
            let mut sub = target.add_group(&child.name)?;
            put_group(&mut sub, child)?;
        }
        Ok(())
    }

    impl ContainerSink for NetCdfSink {
        fn extension(&self) -> &'static str {
            "nc"
        }

        fn write(&self, container: &Container, path: &Path) -> Result<()> {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)?;
            let tmp = Builder::new().suffix(".nc").tempfile_in(dir)?;
            {
                let mut file = netcdf::create(tmp.path())?;
                let mut root = file.root_mut().ok_or_else(|| CodecError::Configuration {
                    message: "netCDF file has no root group".to_string(),
                })?;
                put_group(&mut root, &container.root)?;
            }
            tmp.persist(path).map_err(|e| CodecError::Persist {
                path: path.to_path_buf(),
                source: e.error,
            })?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::container::Group;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("VIS/2024/1/out.csv");
        write_atomic(&path, b"a,b\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"a,b\n");
        // Only the target remains in the directory
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_json_sink() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("c.json");
        let container = Container {
            root: Group::new("/"),
        };
        let sink = JsonContainerSink;
        assert_eq!(sink.extension(), "json");
        sink.write(&container, &path).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed["root"]["name"], "/");
    }
}
