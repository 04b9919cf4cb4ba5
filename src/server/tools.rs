use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyzer::orphan::OrphanOptions;
use crate::analyzer::project::{audit, scan_orphans_in_dir, used_classes_in_dir};
use crate::analyzer::{
    component_usages, duplicate_patterns, parse, query, scan_orphans, used_classes, validate,
};
use crate::config::RazorConfig;
use crate::editor::{batch_rename_class, edit_file, merge_file, MergeOptions};
use crate::error::{MarkupError, Result};
use crate::model::EditOperation;
use crate::splitter::{batch_split_from_list_file, split_path};
use crate::util::read_template;

#[derive(Debug)]
pub enum DispatchError {
    MethodNotFound(String),
    Markup(MarkupError),
}

impl From<MarkupError> for DispatchError {
    fn from(e: MarkupError) -> Self {
        DispatchError::Markup(e)
    }
}

/// メソッド名で処理を振り分ける
///
/// MCP形式の `tools/call`（`{"name": ..., "arguments": ...}`）も受け付ける。
pub fn dispatch(method: &str, params: &Value) -> std::result::Result<Value, DispatchError> {
    if method == "tools/call" {
        let name = params.get("name").and_then(Value::as_str).ok_or_else(|| {
            MarkupError::InvalidArgument("tools/call requires a tool name".to_string())
        })?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        return dispatch(name, &arguments);
    }

    let result = match method {
        "analyze_razor" => analyze_razor(decode(params)?),
        "inspect_razor_dom" => inspect_razor_dom(decode(params)?),
        "edit_razor_dom" => edit_razor_dom(decode(params)?),
        "refactor_razor" => refactor_razor(decode(params)?),
        "merge_razor" => merge_razor(decode(params)?),
        _ => return Err(DispatchError::MethodNotFound(method.to_string())),
    };
    Ok(result?)
}

fn decode<T: DeserializeOwned>(params: &Value) -> Result<T> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params.clone()
    };
    serde_json::from_value(params).map_err(|e| MarkupError::InvalidArgument(e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| MarkupError::Parse(e.to_string()))
}

fn require_existing(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MarkupError::FileNotFound(path.to_path_buf()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisOptions {
    recursive: Option<bool>,
    global_css_path: Option<PathBuf>,
    ignore_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeArgs {
    path: PathBuf,
    analysis_type: String,
    #[serde(default)]
    options: AnalysisOptions,
}

/// 設定ファイルの値を呼び出し引数で上書きする
fn analysis_config(path: &Path, options: &AnalysisOptions) -> RazorConfig {
    let root = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(Path::new("."))
    };
    let mut config = RazorConfig::load_from_dir(root);
    if let Some(recursive) = options.recursive {
        config.recursive = recursive;
    }
    if let Some(global_css) = &options.global_css_path {
        config.global_css = Some(global_css.clone());
    }
    if let Some(ignore_file) = &options.ignore_file_path {
        config.ignore_file = ignore_file.clone();
    }
    config
}

fn analyze_razor(args: AnalyzeArgs) -> Result<Value> {
    let path = args.path.as_path();
    require_existing(path)?;
    let config = analysis_config(path, &args.options);

    match args.analysis_type.to_ascii_lowercase().as_str() {
        "usedclasses" if path.is_dir() => to_json(&used_classes_in_dir(path, config.recursive)?),
        "usedclasses" => to_json(&used_classes(&read_template(path)?)),
        "orphans" => {
            let options = OrphanOptions::from_config(&config);
            if path.is_dir() {
                to_json(&scan_orphans_in_dir(path, config.recursive, &options)?)
            } else {
                to_json(&scan_orphans(path, &options)?)
            }
        }
        "taghelpers" if path.is_dir() => {
            let mut by_file = BTreeMap::new();
            for file in config.template_files(path)? {
                let usages = component_usages(&read_template(&file)?);
                if !usages.is_empty() {
                    let relative = file.strip_prefix(path).unwrap_or(&file).display().to_string();
                    by_file.insert(relative, usages);
                }
            }
            to_json(&by_file)
        }
        "taghelpers" => to_json(&component_usages(&read_template(path)?)),
        "validation" => to_json(&validate(&read_template(path)?)),
        "patterns" => to_json(&duplicate_patterns(&read_template(path)?)),
        "audit" => to_json(&audit(path, &OrphanOptions::from_config(&config))?),
        _ => Err(MarkupError::InvalidArgument(format!(
            "unknown analysis type '{}' (expected UsedClasses, Orphans, TagHelpers, Validation, Patterns or Audit)",
            args.analysis_type
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct InspectArgs {
    path: PathBuf,
    #[serde(default)]
    xpath: Option<String>,
}

fn inspect_razor_dom(args: InspectArgs) -> Result<Value> {
    let content = read_template(&args.path)?;
    match args.xpath.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(xpath) => to_json(&query(&content, xpath)?),
        None => to_json(&parse(&content)),
    }
}

#[derive(Debug, Deserialize)]
struct EditArgs {
    path: PathBuf,
    #[serde(default)]
    operations: Vec<EditOperation>,
}

fn edit_razor_dom(args: EditArgs) -> Result<Value> {
    if !args.path.is_file() {
        return Err(MarkupError::FileNotFound(args.path));
    }
    if args.operations.is_empty() {
        return Ok(Value::String("No operations provided.".to_string()));
    }
    edit_file(&args.path, &args.operations)?;
    Ok(Value::String(format!(
        "Applied {} DOM operations to {}",
        args.operations.len(),
        args.path.display()
    )))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefactorOptions {
    old_class: Option<String>,
    new_class: Option<String>,
    recursive: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefactorArgs {
    path: PathBuf,
    refactoring_type: String,
    #[serde(default)]
    options: RefactorOptions,
}

fn refactor_razor(args: RefactorArgs) -> Result<Value> {
    require_existing(&args.path)?;

    match args.refactoring_type.to_ascii_lowercase().as_str() {
        "split" => Ok(Value::String(split_path(&args.path)?)),
        "batchsplit" => Ok(Value::String(
            batch_split_from_list_file(&args.path)?.to_string(),
        )),
        "batchrenameclass" => {
            let (Some(old_class), Some(new_class)) = (&args.options.old_class, &args.options.new_class)
            else {
                return Err(MarkupError::InvalidArgument(
                    "BatchRenameClass requires oldClass and newClass".to_string(),
                ));
            };
            let report = batch_rename_class(
                &args.path,
                old_class,
                new_class,
                args.options.recursive.unwrap_or(true),
            )?;
            to_json(&report)
        }
        _ => Err(MarkupError::InvalidArgument(format!(
            "unknown refactoring type '{}' (expected Split, BatchSplit or BatchRenameClass)",
            args.refactoring_type
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeArgs {
    logic_path: PathBuf,
    design_path: PathBuf,
    #[serde(default)]
    options: Option<MergeOptions>,
}

fn merge_razor(args: MergeArgs) -> Result<Value> {
    let options = args.options.unwrap_or_default();
    let merged = merge_file(&args.logic_path, &args.design_path, &options)?;
    Ok(Value::String(format!(
        "Merged {} elements from {} into {} (backup: {}.bak)",
        merged,
        args.design_path.display(),
        args.logic_path.display(),
        args.logic_path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_analyze_orphans_and_audit() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Card.razor"), r#"<div class="a b"></div>"#).unwrap();
        fs::write(dir.path().join("Card.razor.css"), ".a {}").unwrap();

        let file = dir.path().join("Card.razor");
        let result = dispatch(
            "analyze_razor",
            &json!({"path": file, "analysisType": "Orphans"}),
        )
        .unwrap();
        assert_eq!(result, json!(["b"]));

        let report = dispatch(
            "analyze_razor",
            &json!({"path": dir.path(), "analysisType": "audit"}),
        )
        .unwrap();
        assert_eq!(report["total_orphans"], 1);
    }

    #[test]
    fn test_analyze_patterns() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("List.razor");
        let item = r#"<li class="item"><span>Repeated entry text</span></li>"#;
        fs::write(&file, format!("<ul>\n{item}\n{item}\n</ul>")).unwrap();

        let result = dispatch(
            "analyze_razor",
            &json!({"path": file, "analysisType": "Patterns"}),
        )
        .unwrap();
        assert_eq!(result[0]["occurrence_count"], 2);
        assert_eq!(result[0]["locations"], json!([2, 3]));
    }

    #[test]
    fn test_unknown_analysis_type_is_invalid_argument() {
        let dir = tempdir().unwrap();
        let err = dispatch(
            "analyze_razor",
            &json!({"path": dir.path(), "analysisType": "Dependencies"}),
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::Markup(e) if e.is_invalid_argument()));
    }

    #[test]
    fn test_edit_through_tools_call() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Page.razor");
        fs::write(&path, "<button>Click</button>").unwrap();

        let result = dispatch(
            "tools/call",
            &json!({
                "name": "edit_razor_dom",
                "arguments": {
                    "path": path,
                    "operations": [
                        {"type": "Wrap", "xpath": "//button", "content": "div", "attributes": {"class": "wrapper"}}
                    ]
                }
            }),
        )
        .unwrap();
        assert!(result.as_str().unwrap().starts_with("Applied 1 DOM operations"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"<div class="wrapper"><button>Click</button></div>"#
        );
    }

    #[test]
    fn test_refactor_rename_requires_classes() {
        let dir = tempdir().unwrap();
        let err = dispatch(
            "refactor_razor",
            &json!({"path": dir.path(), "refactoringType": "BatchRenameClass", "options": {"oldClass": "a"}}),
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::Markup(e) if e.is_invalid_argument()));
    }

    #[test]
    fn test_merge_razor() {
        let dir = tempdir().unwrap();
        let logic = dir.path().join("Logic.razor");
        let design = dir.path().join("Design.html");
        fs::write(&logic, r#"<p data-mcp-id="x" class="old">t</p>"#).unwrap();
        fs::write(&design, r#"<p data-mcp-id="x" class="new">d</p>"#).unwrap();

        let result = dispatch(
            "merge_razor",
            &json!({"logicPath": logic, "designPath": design}),
        )
        .unwrap();
        assert!(result.as_str().unwrap().starts_with("Merged 1 elements"));
        assert_eq!(
            fs::read_to_string(&logic).unwrap(),
            r#"<p data-mcp-id="x" class="new">t</p>"#
        );
    }
}
