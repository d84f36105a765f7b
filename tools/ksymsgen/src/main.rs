//! Generates the kernel symbol tables from the output of `nm -l`.
//!
//! Usage: `nm -l kernel | ksymsgen [--32] > ksyms.S`

use std::{env, io, process};

use io::BufRead;

/// A text symbol: start address and `name\tfile:line` entry.
#[derive(Debug, PartialEq, Eq)]
struct Symbol {
    addr: usize,
    entry: String,
}

fn main() {
    let directive = match env::args().nth(1).as_deref() {
        None => ".quad",
        Some("--32") => ".long",
        Some(arg) => {
            eprintln!("ksymsgen: unknown argument '{}'", arg);
            eprintln!("usage: nm -l <kernel> | ksymsgen [--32]");
            process::exit(2);
        }
    };

    let mut symbols = Vec::new();
    let mut etext = None;
    for line in io::stdin().lock().lines() {
        match line {
            Ok(line) => {
                symbols.extend(parse_nm_line(&line));
                etext = etext.or_else(|| parse_end_marker(&line));
            }
            Err(e) => {
                eprintln!("ksymsgen: {}", e);
                process::exit(1);
            }
        }
    }

    symbols.sort_by_key(|sym| sym.addr);

    match etext {
        Some(end) => terminate(&mut symbols, end),
        None => eprintln!("ksymsgen: warning: no 'etext' symbol, the last function will not resolve"),
    }

    print!("{}", render(&symbols, directive));
}

/// Parses one line of `nm -l` output, keeping text symbols only.
fn parse_nm_line(s: &str) -> Option<Symbol> {
    let (sym, location) = match s.split_once('\t') {
        Some((sym, location)) => (sym, Some(location.trim())),
        None => (s, None),
    };

    let mut fields = sym.split_whitespace();

    // Undefined symbols have no address
    let addr = usize::from_str_radix(fields.next()?, 16).ok()?;
    let kind = fields.next()?;
    let name = fields.next()?;

    if kind != "t" && kind != "T" {
        return None;
    }

    let mut entry = format!("{:#}", rustc_demangle::demangle(name));
    if let Some(location) = location.filter(|l| !l.is_empty()) {
        entry.push('\t');
        entry.push_str(location);
    }

    Some(Symbol { addr, entry })
}

/// Returns the address of `etext`, whatever its symbol type.
fn parse_end_marker(s: &str) -> Option<usize> {
    let mut fields = s.split_whitespace();

    let addr = usize::from_str_radix(fields.next()?, 16).ok()?;
    let _kind = fields.next()?;

    (fields.next()? == "etext").then(|| addr)
}

/// Appends the end of the text section, so that the last function has an upper bound.
///
/// A table entry only spans up to the next one, which means the last entry is never resolved
/// itself.
fn terminate(symbols: &mut Vec<Symbol>, end: usize) {
    if symbols.last().map_or(true, |last| last.addr < end) {
        symbols.push(Symbol {
            addr: end,
            entry: String::from("etext"),
        });
    }
}

/// Renders the four tables as assembly, using `directive` for every word.
fn render(symbols: &[Symbol], directive: &str) -> String {
    let mut out = String::new();

    prologue(&mut out, "ksyms_offsets");
    for sym in symbols {
        out.push_str(&format!("    {} 0x{:x}\n", directive, sym.addr));
    }

    prologue(&mut out, "ksyms_num_syms");
    out.push_str(&format!("    {} {}\n", directive, symbols.len()));

    prologue(&mut out, "ksyms_markers");
    out.push_str(&format!("    {} 0\n", directive));
    let mut acc = 0;
    for sym in symbols {
        acc += sym.entry.len() + 1;
        out.push_str(&format!("    {} {}\n", directive, acc));
    }

    prologue(&mut out, "ksyms_names");
    for sym in symbols {
        out.push_str(&format!("    .asciz \"{}\"\n", escape(&sym.entry)));
    }

    out
}

fn prologue(out: &mut String, label: &str) {
    out.push_str(".section .rodata, \"a\"\n");
    out.push_str(&format!(".global {0}\n.balign 8\n{0}:\n", label));
}

/// Escapes a string for use in an `.asciz` directive.
fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\t' => escaped.push_str("\\t"),
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            c => escaped.push(c),
        }
    }
    escaped
}
