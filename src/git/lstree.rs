//! Parser for `git ls-tree -z` output.

use crate::error::{Result, SyncError};

/// One tree entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeObject {
    pub mode: String,
    /// Object kind: blob, tree, commit (submodule)
    pub kind: String,
    pub oid: String,
    pub path: String,
}

impl TreeObject {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

/// Parse NUL-terminated ls-tree records: `<mode> <kind> <oid>\t<path>`.
pub fn parse(output: &[u8]) -> Result<Vec<TreeObject>> {
    let mut objects = Vec::new();

    for record in output.split(|&b| b == 0) {
        if record.is_empty() {
            continue;
        }

        let text = String::from_utf8_lossy(record);
        let (meta, path) = text
            .split_once('\t')
            .ok_or_else(|| SyncError::git("ls-tree", format!("malformed entry: {}", text)))?;

        let mut fields = meta.split_whitespace();
        let (Some(mode), Some(kind), Some(oid)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(SyncError::git(
                "ls-tree",
                format!("malformed entry: {}", text),
            ));
        };

        objects.push(TreeObject {
            mode: mode.to_string(),
            kind: kind.to_string(),
            oid: oid.to_string(),
            path: path.to_string(),
        });
    }

    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blobs_and_trees() {
        let raw = b"100644 blob e69de29bb2d1d6434b8b29ae775ad8c2e48c5391\tREADME.md\0\
040000 tree d564d0bc3dd917926892c55e3706cc116d5b165e\tsrc\0\
100755 blob 7898192261380f12b53f886cbd7b2e297b2fc22a\tsrc/run.sh\0";

        let objects = parse(raw).expect("parses");
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0].path, "README.md");
        assert!(objects[0].is_blob());
        assert_eq!(objects[1].kind, "tree");
        assert!(!objects[1].is_blob());
        assert_eq!(objects[2].mode, "100755");
        assert_eq!(objects[2].path, "src/run.sh");
    }

    #[test]
    fn path_may_contain_spaces() {
        let raw = b"100644 blob e69de29bb2d1d6434b8b29ae775ad8c2e48c5391\tdocs/release notes.md\0";
        let objects = parse(raw).expect("parses");
        assert_eq!(objects[0].path, "docs/release notes.md");
    }

    #[test]
    fn empty_output_yields_no_objects() {
        assert!(parse(b"").expect("parses").is_empty());
    }

    #[test]
    fn malformed_entry_is_an_error() {
        assert!(parse(b"100644 blob\0").is_err());
    }
}
