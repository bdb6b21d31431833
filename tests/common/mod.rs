//! Fixture corpora shared by the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("fixture file written");
}

/// Three words, two overlapping sentences.
///
/// Slots 1..=3 carry `text` = a, b, c; node 4 covers slots [1,2], node 5
/// covers [2,3]. `gloss` is present-empty on slot 1 and absent on slot 2;
/// `number` is an integer feature; `parent` carries valued edges
/// (2,4,"head") and (3,4,"mod").
pub fn write_tiny_corpus(dir: &Path) {
    write(
        dir,
        "otype.tf",
        "@node\n@valueType=str\n@slotType=word\n@maxSlot=3\n\nsentence\nsentence\n",
    );
    write(dir, "oslots.tf", "@edge\n@valueType=str\n\n1-2\n2-3\n");
    write(dir, "text.tf", "@node\n@valueType=str\n\na\nb\nc\n");
    write(dir, "gloss.tf", "@node\n@valueType=str\n\n1\t\n");
    write(
        dir,
        "number.tf",
        "@node\n@valueType=int\n\n1\t10\n2\t20\n3\t10\n",
    );
    write(
        dir,
        "parent.tf",
        "@edge\n@valueType=str\n@edgeValues=true\n\n2\t4\thead\n3\t4\tmod\n",
    );
    write(dir, "otext.tf", "@config\n@fmt:text-orig-full={text} \n");
}

/// Four words under a book / chapter / verse hierarchy.
///
/// Node 5 is the book "Genesis" over slots 1..=4; nodes 6 and 7 are
/// chapters 1 and 2; nodes 8..=11 are verses 1, 2, 1, 2. Headings exist
/// in the default language and in English (`@en`).
pub fn write_sectioned_corpus(dir: &Path) {
    write(
        dir,
        "otype.tf",
        "@node\n@valueType=str\n@slotType=word\n@maxSlot=4\n\nbook\nchapter\nchapter\nverse\nverse\nverse\nverse\n",
    );
    write(
        dir,
        "oslots.tf",
        "@edge\n@valueType=str\n\n1-4\n1-2\n3-4\n1\n2\n3\n4\n",
    );
    write(
        dir,
        "text.tf",
        "@node\n@valueType=str\n\nIn\nthe\nbeginning\nGod\n",
    );
    write(dir, "bookname.tf", "@node\n@valueType=str\n\n5\tGenesis\n");
    write(dir, "chnum.tf", "@node\n@valueType=int\n\n6\t1\n7\t2\n");
    write(
        dir,
        "vsnum.tf",
        "@node\n@valueType=int\n\n8\t1\n9\t2\n10\t1\n11\t2\n",
    );
    write(
        dir,
        "bookname@en.tf",
        "@node\n@valueType=str\n\n5\tGenesis\n",
    );
    write(dir, "chnum@en.tf", "@node\n@valueType=int\n\n6\t1\n7\t2\n");
    write(
        dir,
        "vsnum@en.tf",
        "@node\n@valueType=int\n\n8\t1\n9\t2\n10\t1\n11\t2\n",
    );
    write(
        dir,
        "otext.tf",
        "@config\n@sectionTypes=book,chapter,verse\n@sectionFeatures=bookname,chnum,vsnum\n@sectionLanguages=en\n@structureTypes=book,chapter\n@structureFeatures=bookname,chnum\n@fmt:text-orig-full={text} \n",
    );
}

/// All regular files under `root`, relative paths sorted, with contents.
pub fn snapshot_files(root: &Path) -> Vec<(String, Vec<u8>)> {
    fn visit(base: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        for entry in fs::read_dir(dir).expect("readable store dir") {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                visit(base, &path, out);
            } else {
                let rel = path
                    .strip_prefix(base)
                    .expect("path under base")
                    .to_string_lossy()
                    .into_owned();
                out.push((rel, fs::read(&path).expect("readable store file")));
            }
        }
    }
    let mut out = Vec::new();
    visit(root, root, &mut out);
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}
