use std::{
    ffi::OsString,
    fmt::Debug,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use fs_err::File;
use serde::{Deserialize, Serialize};

pub fn read_json<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| serde_json::from_reader(BufReader::new(File::open(&path)?)).map_err(anyhow::Error::new))()
        .with_context(|| {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        })
}

/// Like [`read_json`], but a missing file yields `None` instead of an error.
pub fn read_json_if_exists<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<Option<T>> {
    let path = path.into();
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_reader(BufReader::new(file))
        .map(Some)
        .with_context(|| {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        })
}

/// Writes `value` as pretty-printed JSON with a trailing newline.
///
/// The whole document is serialized into memory first, written next to `path`
/// and then renamed over it, so readers never observe a truncated file.
pub fn write_json_pretty_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut buffer = serde_json::to_vec_pretty(value)
        .with_context(|| format!("While serializing {}", std::any::type_name::<T>()))?;
    buffer.push(b'\n');

    let temporary = temporary_sibling(path);
    let result = (|| {
        let mut writer = BufWriter::new(File::create(&temporary)?);
        writer.write_all(&buffer)?;
        writer.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()?;
        fs_err::rename(&temporary, path)
    })();
    if result.is_err() {
        let _ = fs_err::remove_file(&temporary);
    }
    result.with_context(|| format!("While writing {path:?}"))
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("out"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn read_toml<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| toml::from_str(&fs_err::read_to_string(&path)?).map_err(anyhow::Error::new))().with_context(
        || {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        },
    )
}
