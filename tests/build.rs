//! End-to-end builds of small projects, through the library API and the
//! compiled binary.

use docmaker::build::{self, BuildError, BuildOptions};
use docmaker::config::{self, ConfigError};
use docmaker::data;
use docmaker::render::DocRenderer;
use docmaker::render::markup::MarkupOptions;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

// ===========================================================================
// Helpers
// ===========================================================================

fn project(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (relative, content) in files {
        let path = tmp.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    tmp
}

fn options(dir: &Path) -> BuildOptions {
    BuildOptions {
        start_dir: Some(dir.to_path_buf()),
        ..Default::default()
    }
}

fn docmaker(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_docmaker"))
        .arg("--dir")
        .arg(dir)
        .args(args)
        .env_remove("INIT_CWD")
        .output()
        .expect("failed to run docmaker")
}

// ===========================================================================
// Document assembly
// ===========================================================================

#[test]
fn empty_project_renders_layout_with_empty_content() {
    let tmp = project(&[
        ("docmaker.yaml", "layout: layout.html\n"),
        ("layout.html", "<html><body>{{ content }}</body></html>\n"),
    ]);

    build::build(&options(tmp.path())).unwrap();

    let entries: Vec<_> = fs::read_dir(tmp.path().join("build")).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        fs::read_to_string(tmp.path().join("build/index.html")).unwrap(),
        "<html><body></body></html>\n"
    );
}

#[test]
fn pages_ordered_per_pattern() {
    let tmp = project(&[
        (
            "docmaker.yaml",
            "layout: layout.html\npages:\n  - \"intro/*.md\"\n  - \"chapters/*.md\"\n",
        ),
        ("layout.html", "{{ content }}"),
        ("intro/z.md", "# Zeta\n\n"),
        ("chapters/b.md", "# Beta\n\n"),
        ("chapters/a.md", "# Alpha\n\n"),
    ]);

    let report = build::build(&options(tmp.path())).unwrap();
    let names: Vec<_> = report
        .pages
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["z.md", "a.md", "b.md"]);

    let html = fs::read_to_string(&report.document).unwrap();
    let zeta = html.find("Zeta").unwrap();
    let alpha = html.find("Alpha").unwrap();
    let beta = html.find("Beta").unwrap();
    assert!(zeta < alpha && alpha < beta);
}

#[test]
fn data_merge_follows_list_order() {
    let tmp = project(&[
        (
            "docmaker.yaml",
            "layout: layout.html\ndata:\n  - z.yaml\n  - a.json\n",
        ),
        ("layout.html", "{{ version }}"),
        ("z.yaml", "version: from-z\n"),
        ("a.json", "{\"version\": \"from-a\"}"),
    ]);

    build::build(&options(tmp.path())).unwrap();
    assert_eq!(
        fs::read_to_string(tmp.path().join("build/index.html")).unwrap(),
        "from-a"
    );
}

#[test]
fn unmatched_page_glob_still_builds() {
    let tmp = project(&[
        (
            "docmaker.yaml",
            "layout: layout.html\npages: [\"missing/*.md\"]\ndata: [gone.yaml]\n",
        ),
        ("layout.html", "[{{ content }}]"),
    ]);

    let report = build::build(&options(tmp.path())).unwrap();
    assert!(report.pages.is_empty());
    assert_eq!(report.data_sources, 0);
    assert_eq!(fs::read_to_string(report.document).unwrap(), "[]");
}

#[test]
fn dot_slash_patterns_and_undefined_values() {
    let tmp = project(&[
        ("docmaker.yaml", "layout: ./layout.html\npages: [\"./intro.md\"]\n"),
        ("layout.html", "{{ content }}{{ footer }}"),
        ("intro.md", "Version {{ site.version }}.\n"),
    ]);

    let report = build::build(&options(tmp.path())).unwrap();
    assert_eq!(report.pages.len(), 1);
    assert_eq!(fs::read_to_string(report.document).unwrap(), "<p>Version .</p>\n");
}

#[test]
fn written_document_matches_in_memory_render() {
    let tmp = project(&[
        (
            "docmaker.yaml",
            "layout: layout.html\npages: [\"*.md\"]\ndata: [site.yaml]\n",
        ),
        ("layout.html", "<title>{{ title }}</title>\n{{ content }}"),
        ("site.yaml", "title: Handbook\n"),
        ("1.md", "[[toc]]\n\n# {{ title }}\n\n```rust\nfn main() {}\n```\n\n"),
        ("2.md", "## Usage\n\nRun it. {{ pagebreak }}\n"),
    ]);

    let report = build::build(&options(tmp.path())).unwrap();

    let config = config::load_config(tmp.path()).unwrap();
    let namespace = data::aggregate(&config.root, &config.data).unwrap();
    let renderer = DocRenderer::new(namespace, MarkupOptions::default());
    let expected = renderer.render_document(&config.layout, &config.pages).unwrap();

    let written = fs::read_to_string(&report.document).unwrap();
    assert_eq!(written, expected);
    assert_eq!(report.document_bytes, expected.len());
    assert!(written.contains("<a href=\"#usage\">Usage</a>"));
}

// ===========================================================================
// Assets
// ===========================================================================

#[test]
fn template_assets_rendered_and_others_copied() {
    let tmp = project(&[
        (
            "docmaker.yaml",
            "layout: layout.html\ndata: [site.yaml]\nassets:\n  - assets/about.liquid\n  - assets/style.css\n",
        ),
        ("layout.html", "{{ content }}"),
        ("site.yaml", "name: Docmaker\n"),
        ("assets/about.liquid", "About {{ name }}\n"),
        ("assets/style.css", "body {\n  margin: 0;\n}\n"),
    ]);

    build::build(&options(tmp.path())).unwrap();

    let build_dir = tmp.path().join("build");
    assert_eq!(fs::read_to_string(build_dir.join("about")).unwrap(), "About Docmaker\n");
    assert!(!build_dir.join("about.liquid").exists());
    assert_eq!(
        fs::read(build_dir.join("style.css")).unwrap(),
        fs::read(tmp.path().join("assets/style.css")).unwrap()
    );
}

#[test]
fn liquid_asset_filters_and_missing_values() {
    let tmp = project(&[
        ("docmaker.yaml", "layout: layout.html\ndata: [site.yaml]\nassets: [about.liquid]\n"),
        ("layout.html", "{{ content }}"),
        ("site.yaml", "name: Docmaker\n"),
        ("about.liquid", "{{ name | upcase }}{{ site.tagline }}\n"),
    ]);

    build::build(&options(tmp.path())).unwrap();
    assert_eq!(fs::read_to_string(tmp.path().join("build/about")).unwrap(), "DOCMAKER\n");
}

#[test]
fn rebuild_without_clean_fails_on_existing_copy() {
    let tmp = project(&[
        ("docmaker.yaml", "layout: layout.html\nassets: [style.css]\n"),
        ("layout.html", "{{ content }}"),
        ("style.css", "a {}"),
    ]);

    build::build(&options(tmp.path())).unwrap();
    let err = build::build(&options(tmp.path())).unwrap_err();
    assert!(matches!(err, BuildError::Asset(_)));
    assert!(!err.is_user_facing());

    let report = build::build(&BuildOptions {
        clean: true,
        ..options(tmp.path())
    })
    .unwrap();
    assert_eq!(report.assets.len(), 1);
}

// ===========================================================================
// Failures
// ===========================================================================

#[test]
fn missing_layout_aborts_without_build_dir() {
    let tmp = project(&[("docmaker.yaml", "layout: nowhere.html\n")]);

    let err = build::build(&options(tmp.path())).unwrap_err();
    assert!(matches!(err, BuildError::Config(ConfigError::LayoutMissing(_))));
    assert!(err.is_user_facing());
    assert!(!tmp.path().join("build").exists());
}

#[test]
fn clean_never_touches_files_outside_the_project() {
    let tmp = project(&[
        ("proj/docmaker.yaml", "layout: layout.html\nbuildDir: ../victim\n"),
        ("proj/layout.html", "{{ content }}"),
        ("victim/precious.txt", "keep me"),
    ]);

    let err = build::build(&BuildOptions {
        clean: true,
        ..options(&tmp.path().join("proj"))
    })
    .unwrap_err();
    assert!(matches!(err, BuildError::Config(ConfigError::Invalid(_))));
    assert!(err.to_string().contains("buildDir"));
    assert_eq!(fs::read_to_string(tmp.path().join("victim/precious.txt")).unwrap(), "keep me");
}

#[test]
fn invalid_config_lists_every_violation() {
    let tmp = project(&[("docmaker.yaml", "buildDir: \"\"\npages: notalist\n")]);

    let err = build::build(&options(tmp.path())).unwrap_err();
    let message = err.to_string();
    assert!(err.is_user_facing());
    assert!(message.contains("layout"));
    assert!(message.contains("buildDir"));
    assert!(message.contains("pages"));
}

// ===========================================================================
// Binary
// ===========================================================================

#[test]
fn binary_builds_by_default() {
    let tmp = project(&[
        ("docmaker.yaml", "layout: layout.html\npages: [\"*.md\"]\n"),
        ("layout.html", "{{ content }}"),
        ("a.md", "Hello\n"),
    ]);

    let out = docmaker(tmp.path(), &[]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        fs::read_to_string(tmp.path().join("build/index.html")).unwrap(),
        "<p>Hello</p>\n"
    );
    assert!(String::from_utf8_lossy(&out.stdout).contains("Built 1 page"));
}

#[test]
fn binary_missing_layout_exits_1_with_message() {
    let tmp = project(&[("docmaker.yaml", "layout: nowhere.html\n")]);

    let out = docmaker(tmp.path(), &["build"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Could not find layout file with path"));
    assert!(!stderr.contains("caused by"));
    assert!(!tmp.path().join("build").exists());
}

#[test]
fn binary_check_writes_nothing() {
    let tmp = project(&[
        ("docmaker.yaml", "layout: layout.html\n"),
        ("layout.html", "{{ content }}"),
    ]);

    let out = docmaker(tmp.path(), &["check"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("Project is valid"));
    assert!(!tmp.path().join("build").exists());
}

#[test]
fn binary_gen_config_prints_parseable_yaml() {
    let tmp = TempDir::new().unwrap();
    let out = docmaker(tmp.path(), &["gen-config"]);
    assert!(out.status.success());

    let yaml = String::from_utf8(out.stdout).unwrap();
    let parsed = config::parse_config(&yaml, Path::new("docmaker.yaml")).unwrap();
    assert_eq!(parsed.layout, "layout.html");
}
