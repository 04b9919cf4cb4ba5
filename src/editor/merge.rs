//! デザイン側テンプレートのスタイル属性をロジック側へ取り込む
//!
//! 両方の要素をID属性（既定 `data-mcp-id`）で突き合わせ、
//! 指定された属性（既定 `class`, `style`）をデザイン側の値で上書きする。

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{apply_splices, attribute_splices};
use crate::analyzer::structure::Document;
use crate::error::{MarkupError, Result};
use crate::util::{backup_overwrite, read_template, write_text};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOptions {
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
    #[serde(default = "default_attributes_to_merge")]
    pub attributes_to_merge: Vec<String>,
}

fn default_id_attribute() -> String {
    "data-mcp-id".to_string()
}

fn default_attributes_to_merge() -> Vec<String> {
    vec!["class".to_string(), "style".to_string()]
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            id_attribute: default_id_attribute(),
            attributes_to_merge: default_attributes_to_merge(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub content: String,
    /// ID が一致した要素の数
    pub merged: usize,
}

/// デザイン側の属性値をロジック側テキストへ反映する
pub fn merge_styles(logic: &str, design: &str, options: &MergeOptions) -> Result<MergeOutcome> {
    if options.id_attribute.trim().is_empty() {
        return Err(MarkupError::InvalidArgument(
            "merge id attribute must not be empty".to_string(),
        ));
    }

    let design_doc = Document::parse(design);
    let mut design_by_id = HashMap::new();
    for (index, record) in design_doc.iter() {
        if let Some(id) = record.attribute_value(&options.id_attribute).filter(|v| !v.is_empty()) {
            design_by_id.insert(id.to_string(), index);
        }
    }

    let logic_doc = Document::parse(logic);
    let mut splices = Vec::new();
    let mut merged = 0;

    for (_, record) in logic_doc.iter() {
        let Some(id) = record.attribute_value(&options.id_attribute) else {
            continue;
        };
        let Some(&design_index) = design_by_id.get(id) else {
            continue;
        };
        let design_record = design_doc.node(design_index);

        let changes: BTreeMap<String, String> = options
            .attributes_to_merge
            .iter()
            .filter_map(|name| {
                design_record
                    .attribute_value(name)
                    .map(|value| (name.clone(), value.to_string()))
            })
            .collect();

        splices.extend(attribute_splices(record, &changes));
        merged += 1;
    }

    Ok(MergeOutcome {
        content: apply_splices(logic, splices),
        merged,
    })
}

/// ロジック側ファイルへ取り込み、`.bak` を書き直してから保存する
pub fn merge_file(logic_path: &Path, design_path: &Path, options: &MergeOptions) -> Result<usize> {
    let logic = read_template(logic_path)?;
    let design = read_template(design_path)?;

    let outcome = merge_styles(&logic, &design, options)?;
    backup_overwrite(logic_path, &logic)?;
    write_text(logic_path, &outcome.content)?;

    info!(
        "Merged {} elements from {} into {}",
        outcome.merged,
        design_path.display(),
        logic_path.display()
    );
    Ok(outcome.merged)
}
