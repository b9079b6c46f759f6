// Shared fixtures: a scripted stand-in for the PDF toolkit
//
// The script is run as `/bin/sh <script> <subcommand...>`, records every invocation to
// `calls.log`, and answers from files placed next to it.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use pdf_editor::config::settings::Settings;
use tempfile::TempDir;

const SCRIPT: &str = r#"
DIR="$(dirname "$0")"
echo "$*" >> "$DIR/calls.log"
case "$1" in
  info)
    cat "$DIR/info.txt"
    ;;
  images)
    case "$2" in
      list)
        cat "$DIR/images.txt"
        ;;
      update)
        if [ -f "$DIR/update_fails" ]; then echo "images update: corrupt object"; exit 1; fi
        cp "$3" "$5"
        ;;
    esac
    ;;
  optimize)
    cp "$2" "$3"
    ;;
  pages)
    cp "$6" "$7"
    ;;
  watermark)
    if [ -f "$DIR/no_watermarks" ]; then echo "pdfcpu: no watermarks found"; exit 1; fi
    cp "$4" "$5"
    ;;
  stamp)
    if [ -f "$DIR/no_stamps" ]; then echo "pdfcpu: no stamps found"; exit 1; fi
    cp "$4" "$5"
    ;;
  extract)
    for f in "$DIR"/extracted/*; do
      [ -e "$f" ] && cp "$f" "$5/"
    done
    ;;
  *)
    echo "unknown command: $1"
    exit 2
    ;;
esac
exit 0
"#;

pub struct FakeTool {
    pub dir: TempDir,
}

impl FakeTool {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("tool.sh"), SCRIPT).expect("write script");
        fs::write(dir.path().join("info.txt"), "Page count: 1\n").expect("write info");
        fs::write(dir.path().join("images.txt"), "").expect("write listing");
        fs::create_dir(dir.path().join("extracted")).expect("extract dir");
        FakeTool { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            tool: "/bin/sh".to_string(),
            tool_args: vec![self.path().join("tool.sh").to_string_lossy().into_owned()],
            ..Settings::default()
        }
    }

    pub fn set_page_count(&self, pages: u32) {
        fs::write(self.path().join("info.txt"), format!("Page count: {pages}\n"))
            .expect("write info");
    }

    pub fn set_listing(&self, listing: &str) {
        fs::write(self.path().join("images.txt"), listing).expect("write listing");
    }

    /// Create a marker file that switches a scripted failure on.
    pub fn enable(&self, marker: &str) {
        fs::write(self.path().join(marker), "").expect("write marker");
    }

    pub fn add_extracted(&self, name: &str, bytes: &[u8]) {
        fs::write(self.path().join("extracted").join(name), bytes).expect("write extracted");
    }

    /// A placeholder input document inside the fixture directory.
    pub fn document(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).expect("write document");
        path
    }

    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

/// One listing row.
#[derive(Debug, Clone)]
pub struct Row {
    pub page: u32,
    pub object: String,
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub size: String,
}

pub fn row(page: u32, object: &str, id: &str, width: u32, height: u32, size: &str) -> Row {
    Row {
        page,
        object: object.to_string(),
        id: id.to_string(),
        width,
        height,
        size: size.to_string(),
    }
}

/// The same image on each of `pages`; object numbers are `obj_base + page`.
pub fn repeated(
    id: &str,
    obj_base: u32,
    pages: impl IntoIterator<Item = u32>,
    width: u32,
    height: u32,
    size: &str,
) -> Vec<Row> {
    pages
        .into_iter()
        .map(|p| row(p, &(obj_base + p).to_string(), id, width, height, size))
        .collect()
}

/// Render rows as a pipe-delimited `images list` table.
pub fn listing(rows: &[Row]) -> String {
    let mut out = String::from("doc.pdf:\n");
    out.push_str(&format!("{} images available\n\n", rows.len()));
    out.push_str(
        "Page | Obj# | Id | Type | SoftMask | ImgMask | Width | Height | ColorSpace | Comp | bpc | Interp | Size\n",
    );
    out.push_str("-----+------+----+------+----------+---------+-------+--------+------------+------+-----+--------+------\n");
    for r in rows {
        out.push_str(&format!(
            "{} | {} | {} | image |  |  | {} | {} | DeviceRGB | 3 | 8 |  | {}\n",
            r.page, r.object, r.id, r.width, r.height, r.size
        ));
    }
    out
}
