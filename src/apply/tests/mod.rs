use crate::parse::parse_plan;
use crate::plan::{Hunk, Line, Plan};
use crate::store::MemoryStore;

use super::ApplyConfig;

mod matching;

fn parse_patch(body: &str) -> Plan {
    parse_plan(&format!("*** Begin Patch\n{body}\n*** End Patch\n")).expect("patch should parse")
}

fn exact_config() -> ApplyConfig {
    ApplyConfig::default()
}

fn store_with(files: &[(&str, &str)]) -> MemoryStore {
    let mut store = MemoryStore::new();
    for (path, contents) in files {
        store.insert(*path, *contents);
    }
    store
}

fn text_of(store: &MemoryStore, path: &str) -> String {
    String::from_utf8(store.contents(path).expect("file should exist").to_vec())
        .expect("contents should be UTF-8")
}

fn hunk(lines: Vec<Line>) -> Hunk {
    Hunk {
        old_range: None,
        new_range: None,
        section: None,
        lines,
    }
}

fn context(text: &str) -> Line {
    Line::Context(text.to_string())
}

fn addition(text: &str) -> Line {
    Line::Addition(text.to_string())
}

fn deletion(text: &str) -> Line {
    Line::Deletion(text.to_string())
}
