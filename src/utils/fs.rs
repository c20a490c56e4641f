//! IO helper: JSON 文件读写

use std::{fs::File, io::BufReader, io::BufWriter, path::Path};

use serde::Serialize;
use serde_json::Value;

use crate::model::node_store::TreeError;

/// 从文件读取JSON数据
pub fn read_json_file(p: &Path) -> Result<Value, TreeError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: Value = serde_json::from_reader(rdr)?;
    Ok(v)
}

/// 将可序列化数据保存到文件（格式化输出）
pub fn write_json_file<T: Serialize + ?Sized>(p: &Path, value: &T) -> Result<(), TreeError> {
    let f = File::create(p)?;
    serde_json::to_writer_pretty(BufWriter::new(f), value)?;
    Ok(())
}
