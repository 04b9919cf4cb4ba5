//! テンプレートに対する一連の操作（解析・分離・置換・編集）をファイル越しに検証する統合テスト

use std::fs;
use std::path::Path;

use rstest::{fixture, rstest};
use tempfile::{tempdir, TempDir};

use razor_markup::analyzer::orphan::find_orphans;
use razor_markup::analyzer::{audit, query, scan_orphans, OrphanOptions};
use razor_markup::editor::{apply_all, batch_rename_class};
use razor_markup::model::EditOperation;
use razor_markup::splitter::{batch_split_from_list_file, split_file};

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

/// Pages/ 以下に小さなコンポーネント群を置いたプロジェクト
#[fixture]
fn project() -> TempDir {
    let dir = tempdir().unwrap();
    write(dir.path(), "Shop.csproj", "<Project Sdk=\"Microsoft.NET.Sdk.Razor\" />");
    write(
        dir.path(),
        "Pages/Cart.razor",
        r#"<div class="cart btn">
    <button class="btn btn-primary" @onclick="Checkout">Pay</button>
</div>

@code {
    private void Checkout() { }
}

<style>
    .cart { display: flex; }
</style>
"#,
    );
    write(
        dir.path(),
        "Pages/Home.razor",
        r#"<h1 class="title">Home</h1>"#,
    );
    write(dir.path(), "Pages/Home.razor.css", ".title { font-weight: bold; }");
    dir
}

// ============================================================
// 孤立クラス
// ============================================================

#[rstest]
#[case("", &["a", "b"])]
#[case(".a { color: red; }", &["b"])]
#[case(".a, .b:hover { color: red; }", &[])]
fn test_orphans_against_stylesheet(#[case] css: &str, #[case] expected: &[&str]) {
    let template = r#"<div class="a b"></div>"#;
    let stylesheet = (!css.is_empty()).then_some(css);
    assert_eq!(find_orphans(template, stylesheet, &OrphanOptions::new()), expected);
}

#[rstest]
fn test_scan_orphans_uses_companion_stylesheet(project: TempDir) {
    let orphans = scan_orphans(&project.path().join("Pages/Home.razor"), &OrphanOptions::new()).unwrap();
    assert!(orphans.is_empty());

    let orphans = scan_orphans(
        &project.path().join("Pages/Home.razor"),
        &OrphanOptions::new().with_whitelist(["title"]),
    )
    .unwrap();
    assert!(orphans.is_empty());
}

#[rstest]
fn test_audit_report(project: TempDir) {
    write(project.path(), "Pages/Home.razor", r#"<h1 class="title subtitle">Home</h1>"#);

    let report = audit(project.path(), &OrphanOptions::new()).unwrap();
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.files_with_orphans, 1);
    assert_eq!(report.total_orphans, 1);

    let text = report.to_string();
    assert!(text.contains("    - subtitle"));
    assert!(text.contains("Audit Complete."));
    assert!(text.contains("Orphan Warnings: 1 classes in 1 files."));
}

// ============================================================
// 分離
// ============================================================

#[rstest]
fn test_split_uses_project_namespace(project: TempDir) {
    let message = split_file(&project.path().join("Pages/Cart.razor")).unwrap();
    assert_eq!(message, "Successfully split Cart.razor");

    let cs = read(project.path(), "Pages/Cart.razor.cs");
    assert!(cs.contains("namespace Shop.Pages"));
    assert!(cs.contains("public partial class Cart"));
    assert!(cs.contains("private void Checkout() { }"));

    assert_eq!(read(project.path(), "Pages/Cart.razor.css"), ".cart { display: flex; }");

    let markup = read(project.path(), "Pages/Cart.razor");
    assert!(markup.starts_with("<div class=\"cart btn\">"));
    assert!(!markup.contains("@code"));
    assert!(!markup.contains("<style>"));
}

#[rstest]
fn test_batch_split_from_json_list(project: TempDir) {
    let cart = project.path().join("Pages/Cart.razor");
    let missing = project.path().join("Pages/Missing.razor");
    let list = serde_json::to_string(&[&cart, &missing]).unwrap();
    write(project.path(), "split-list.json", &list);

    let report = batch_split_from_list_file(&project.path().join("split-list.json")).unwrap();
    assert_eq!(report.processed(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.skipped(), 1);
    assert!(project.path().join("Pages/Cart.razor.cs").exists());
}

// ============================================================
// クラス名の一括置換
// ============================================================

#[rstest]
fn test_batch_rename_keeps_longer_tokens(project: TempDir) {
    let report = batch_rename_class(project.path(), "btn", "button-base", true).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.modified_files, vec![project.path().join("Pages/Cart.razor")]);
    assert_eq!(report.total_replacements, 2);

    let cart = read(project.path(), "Pages/Cart.razor");
    assert!(cart.contains(r#"<div class="cart button-base">"#));
    assert!(cart.contains(r#"class="button-base btn-primary""#));
    assert!(project.path().join("Pages/Cart.razor.bak").exists());
    assert!(!project.path().join("Pages/Home.razor.bak").exists());
}

// ============================================================
// 構造編集
// ============================================================

#[test]
fn test_edits_apply_in_sequence() {
    let source = r#"<ul class="menu">
    <li>Home</li>
</ul>
@if (ShowAdmin)
{
    <p>admin</p>
}"#;

    let edited = apply_all(
        source,
        &[
            EditOperation::append("/ul[1]", "<li>About</li>"),
            EditOperation::wrap("/ul[1]", "nav").with_attribute("class", "top"),
            EditOperation::update("//p", Some("administrator")),
        ],
    )
    .unwrap();

    assert!(edited.starts_with(r#"<nav class="top"><ul class="menu">"#));
    assert!(edited.contains("<li>About</li></ul></nav>"));
    assert!(edited.contains("@if (ShowAdmin)"));
    assert!(edited.contains("<p>administrator</p>"));

    let items = query(&edited, "//li").unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].path, "/nav[1]/ul[1]/li[2]");
}

#[test]
fn test_failed_edit_reports_path() {
    let err = apply_all("<div></div>", &[EditOperation::update("//span", Some("x"))]).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("//span"));
}
