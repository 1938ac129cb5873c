// =====================================================================
// File: bin/btreedb.rs
// Description:
//   Entry point for a small interactive demo of the B-tree record
//   index. Reads commands from standard input, drives a `Tree`, and
//   prints responses to standard output. This binary is the external
//   "driver" the core contract assumes — it owns prompting, formatting,
//   and the REPL loop; the core does nothing but answer insert/search/
//   update/remove/dump calls.
//
//   Commands:
//     INSERT <id> <name> <age>
//     SEARCH <id>
//     UPDATE <id> <name> <age>
//     REMOVE <id>
//     DUMP
//     EXIT
// =====================================================================
use std::io::{self, BufRead, Write};

use btree_record_index::{BTreeError, Tree};

const DEFAULT_SNAPSHOT: &str = "btree_data.json";
const DEFAULT_T: usize = 2;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let snapshot_path = args.next().unwrap_or_else(|| DEFAULT_SNAPSHOT.to_string());
    let t: usize = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_T);

    let mut tree = match Tree::open(&snapshot_path, t) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("fatal: {e}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.expect("reading a line from stdin");
        let (cmd, args) = parse_command(&line);

        match cmd.as_str() {
            "INSERT" => handle_insert(&mut tree, &args, &mut out),
            "SEARCH" => handle_search(&tree, &args, &mut out),
            "UPDATE" => handle_update(&mut tree, &args, &mut out),
            "REMOVE" => handle_remove(&mut tree, &args, &mut out),
            "DUMP" => handle_dump(&tree, &mut out),
            "EXIT" | "QUIT" => break,
            "" => continue,
            other => {
                let _ = writeln!(out, "ERR unknown command '{other}'");
            }
        }
    }
}

fn parse_command(line: &str) -> (String, Vec<String>) {
    let mut parts = line.trim().split_whitespace();
    let cmd = parts.next().unwrap_or("").to_uppercase();
    let args = parts.map(|s| s.to_string()).collect();
    (cmd, args)
}

fn handle_insert(tree: &mut Tree, args: &[String], out: &mut impl Write) {
    let (Some(id), Some(name), Some(age)) = (args.first(), args.get(1), args.get(2)) else {
        let _ = writeln!(out, "ERR INSERT requires <id> <name> <age>");
        return;
    };
    let (Ok(id), Ok(age)) = (id.parse::<i64>(), age.parse::<u32>()) else {
        let _ = writeln!(out, "ERR INSERT: id and age must be integers");
        return;
    };

    match tree.insert(btree_record_index::Record::new(id, name.clone(), age)) {
        Ok(()) => {
            let _ = writeln!(out, "OK");
        }
        Err(BTreeError::DuplicateKey(id)) => {
            let _ = writeln!(out, "ERR duplicate key {id}");
        }
        Err(e) => {
            let _ = writeln!(out, "ERR {e}");
        }
    }
}

fn handle_search(tree: &Tree, args: &[String], out: &mut impl Write) {
    let Some(Ok(id)) = args.first().map(|s| s.parse::<i64>()) else {
        let _ = writeln!(out, "ERR SEARCH requires <id>");
        return;
    };
    match tree.search(id) {
        Some(r) => {
            let _ = writeln!(out, "{} {} {}", r.id, r.name, r.age);
        }
        None => {
            let _ = writeln!(out, "nil");
        }
    }
}

fn handle_update(tree: &mut Tree, args: &[String], out: &mut impl Write) {
    let (Some(id), Some(name), Some(age)) = (args.first(), args.get(1), args.get(2)) else {
        let _ = writeln!(out, "ERR UPDATE requires <id> <name> <age>");
        return;
    };
    let (Ok(id), Ok(age)) = (id.parse::<i64>(), age.parse::<u32>()) else {
        let _ = writeln!(out, "ERR UPDATE: id and age must be integers");
        return;
    };

    match tree.update(id, name.clone(), age) {
        Ok(()) => {
            let _ = writeln!(out, "OK");
        }
        Err(BTreeError::NotFound(id)) => {
            let _ = writeln!(out, "ERR not found {id}");
        }
        Err(e) => {
            let _ = writeln!(out, "ERR {e}");
        }
    }
}

fn handle_remove(tree: &mut Tree, args: &[String], out: &mut impl Write) {
    let Some(Ok(id)) = args.first().map(|s| s.parse::<i64>()) else {
        let _ = writeln!(out, "ERR REMOVE requires <id>");
        return;
    };
    match tree.remove(id) {
        Ok(true) => {
            let _ = writeln!(out, "1");
        }
        Ok(false) => {
            let _ = writeln!(out, "0");
        }
        Err(e) => {
            let _ = writeln!(out, "ERR {e}");
        }
    }
}

fn handle_dump(tree: &Tree, out: &mut impl Write) {
    for r in tree.dump() {
        let _ = writeln!(out, "{} {} {}", r.id, r.name, r.age);
    }
    let _ = writeln!(out, "END");
}
