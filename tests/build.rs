use doc_splitter::{check_sources, BuildConfig, DocumentationBuilder, Language};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Site {
    _dir: TempDir,
    src: PathBuf,
    build: PathBuf,
}

impl Site {
    fn new(files: &[(&str, &[u8])]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let build = dir.path().join("build");
        std::fs::create_dir_all(&src).unwrap();

        for (path, content) in files {
            let full = src.join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }

        Self {
            _dir: dir,
            src,
            build,
        }
    }

    fn builder(&self) -> DocumentationBuilder {
        DocumentationBuilder::new(BuildConfig {
            src_dir: self.src.clone(),
            build_dir: self.build.clone(),
            ..BuildConfig::default()
        })
    }

    fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.build.join(relative)).unwrap()
    }

    fn exists(&self, relative: &str) -> bool {
        self.build.join(relative).exists()
    }
}

#[tokio::test]
async fn test_build_all_routes_every_kind_of_file() {
    let site = Site::new(&[
        (
            "oss/index.mdx",
            b"# Welcome\n:::python\nPy\n:::\n:::js\nJs\n:::\n",
        ),
        ("oss/guides/setup.md", b"# Setup\n"),
        ("oss/javascript/only-js.mdx", b"JS only\n"),
        ("oss/config.json", b"{\"name\": \"test\"}"),
        ("oss/TEMPLATE.mdx", b"template"),
        (
            "langsmith/home.mdx",
            b":::python\nP\n:::\n:::js\nJ\n:::\n",
        ),
        ("images/logo.png", b"PNG_DATA"),
        ("docs.yml", b"name: test\nnav:\n  - a\n"),
        ("notes.txt", b"ignored"),
    ]);

    let report = site.builder().build_all().await.unwrap();

    assert_eq!(report.built, 10);
    assert_eq!(report.skipped, 2);

    assert_eq!(site.read("oss/python/index.mdx"), "# Welcome\nPy\n");
    assert_eq!(site.read("oss/javascript/index.mdx"), "# Welcome\nJs\n");
    assert_eq!(site.read("oss/python/guides/setup.mdx"), "# Setup\n");
    assert!(site.exists("oss/javascript/guides/setup.mdx"));
    assert_eq!(site.read("oss/javascript/only-js.mdx"), "JS only\n");
    assert!(!site.exists("oss/python/only-js.mdx"));
    assert!(site.exists("oss/python/config.json"));
    assert!(site.exists("oss/javascript/config.json"));
    assert_eq!(site.read("langsmith/home.mdx"), "P\n");
    assert_eq!(site.read("images/logo.png"), "PNG_DATA");
    assert!(!site.exists("notes.txt"));
    assert!(!site.exists("oss/python/TEMPLATE.mdx"));

    let nav: serde_json::Value = serde_json::from_str(&site.read("docs.json")).unwrap();
    assert_eq!(nav["name"], "test");
    assert_eq!(nav["nav"][0], "a");
}

#[tokio::test]
async fn test_build_fails_on_malformed_document() {
    let site = Site::new(&[
        ("oss/ok.mdx", b"fine\n"),
        ("oss/broken.mdx", b"intro\n:::python\nnever closed\n"),
    ]);

    let err = site.builder().build_all().await.unwrap_err();

    assert!(err.is_markup_error());
    assert!(err.to_string().contains("broken.mdx:2"));
    assert!(!site.exists("oss/python/broken.mdx"));
}

#[tokio::test]
async fn test_build_clears_stale_output() {
    let site = Site::new(&[("index.mdx", b"# Home\n")]);
    std::fs::create_dir_all(&site.build).unwrap();
    std::fs::write(site.build.join("stale.mdx"), "old").unwrap();

    site.builder().build_all().await.unwrap();

    assert!(!site.exists("stale.mdx"));
    assert_eq!(site.read("index.mdx"), "# Home\n");
}

#[tokio::test]
async fn test_build_refuses_output_overlapping_sources() {
    let site = Site::new(&[("oss/a.mdx", b"A\n")]);
    let root = site.src.parent().unwrap().to_path_buf();

    for build_dir in [site.src.clone(), root, site.src.join("out")] {
        let builder = DocumentationBuilder::new(BuildConfig {
            src_dir: site.src.clone(),
            build_dir,
            ..BuildConfig::default()
        });

        assert!(builder.build_all().await.is_err());
        assert!(site.src.join("oss/a.mdx").exists());
    }
}

#[tokio::test]
async fn test_snippets_resolve_blocks_with_default_language() {
    let site = Site::new(&[(
        "snippets/x.mdx",
        b"Install:\n:::python\npip install x\n:::\n:::js\nnpm i x\n:::\nLiteral \\:::python here\n",
    )]);

    site.builder().build_all().await.unwrap();

    let snippet = site.read("snippets/x.mdx");
    assert_eq!(snippet, "Install:\npip install x\nLiteral :::python here\n");
    assert!(!snippet.lines().any(|line| line.starts_with(":::")));
    assert!(!snippet.contains("\\:::"));
}

#[tokio::test]
async fn test_build_files_builds_only_requested() {
    let site = Site::new(&[
        ("oss/a.mdx", b"A\n"),
        ("oss/b.mdx", b"B\n"),
    ]);

    let report = site
        .builder()
        .build_files(&[site.src.join("oss/a.mdx")])
        .await
        .unwrap();

    assert_eq!(report.built, 2);
    assert!(site.exists("oss/python/a.mdx"));
    assert!(!site.exists("oss/python/b.mdx"));
}

#[tokio::test]
async fn test_manifest_lists_outputs() {
    let site = Site::new(&[("oss/a.mdx", b"A\n")]);
    let builder = site.builder();

    let report = builder.build_all().await.unwrap();
    let path = builder.write_manifest(&report).await.unwrap();

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(manifest["built"], 2);
    assert_eq!(manifest["outputs"].as_array().unwrap().len(), 2);
    assert_eq!(manifest["outputs"][0]["language"], "js");
    assert_eq!(manifest["outputs"][0]["kind"], "preprocessed");
}

#[tokio::test]
async fn test_check_sources_reports_without_writing() {
    let site = Site::new(&[
        ("oss/good.mdx", b":::js\nx\n:::\n"),
        ("oss/typo.mdx", b":::pyton\nx\n:::\n"),
        ("oss/data.json", b"{}"),
    ]);

    let report = check_sources(&[site.src.clone()]).await.unwrap();

    assert_eq!(report.checked, 2);
    assert_eq!(report.regions, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("pyton"));
    assert!(!site.build.exists());
}

#[tokio::test]
async fn test_split_file_writes_language_subdirectories() {
    let site = Site::new(&[("page.md", b"shared\n:::python\npy\n:::\n")]);
    let out = site.build.join("split");

    let report = site
        .builder()
        .split_file(&site.src.join("page.md"), &out, &[Language::Python, Language::Js])
        .await
        .unwrap();

    assert_eq!(report.built, 2);
    assert_eq!(read(&out.join("python/page.md")), "shared\npy\n");
    assert_eq!(read(&out.join("javascript/page.md")), "shared\n");
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
