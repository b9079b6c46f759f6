// SHA-256 fingerprint of a document file
//
// Stored in analyses so a later removal or preview can tell whether the analysis still
// describes the file it is pointed at.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;

/// ファイル全体のSHA-256ハッシュを小文字16進文字列で返す。
pub fn document_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
