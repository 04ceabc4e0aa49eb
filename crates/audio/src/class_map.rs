use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ClassMapRecord {
    index: usize,
    display_name: String,
}

/// Display names of the classifier outputs, in output order.
///
/// Reads the `index,mid,display_name` CSV shipped with YAMNet.
#[derive(Debug, Clone)]
pub struct ClassMap {
    names: Arc<[String]>,
}

impl ClassMap {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open class map {:?}", path))?;
        Self::from_reader(file).with_context(|| format!("parse class map {:?}", path))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let mut names = Vec::new();
        for (position, record) in csv.deserialize::<ClassMapRecord>().enumerate() {
            let record = record?;
            if record.index != position {
                bail!(
                    "class map row {} declares index {}",
                    position,
                    record.index
                );
            }
            names.push(record.display_name);
        }
        if names.is_empty() {
            bail!("class map has no classes");
        }
        Ok(Self {
            names: names.into(),
        })
    }

    pub fn names(&self) -> Arc<[String]> {
        self.names.clone()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_display_names() {
        let csv = "index,mid,display_name\n\
                   0,/m/09x0r,Speech\n\
                   1,/m/0ytgt,\"Child speech, kid speaking\"\n\
                   2,/m/05r5c,Piano\n";
        let map = ClassMap::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.names()[1], "Child speech, kid speaking");
    }

    #[test]
    fn rejects_out_of_order_rows() {
        let csv = "index,mid,display_name\n1,/m/09x0r,Speech\n";
        assert!(ClassMap::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn rejects_empty_map() {
        assert!(ClassMap::from_reader("index,mid,display_name\n".as_bytes()).is_err());
    }
}
