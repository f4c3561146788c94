//! Size reports over the build output.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::context::BuildContext;
use crate::exec::{CommandRunner, ExecError, Invocation};

pub const DEFAULT_OBJECT_LIMIT: usize = 75;
pub const DEFAULT_SYMBOL_LIMIT: usize = 25;

/// Link aggregates that would otherwise dominate the object report.
const AGGREGATE_OBJECTS: &[&str] = &["built-in.o", "vmlinux.o"];

#[derive(Debug, Error)]
pub enum InspectError {
  #[error("build output directory not found: {}", path.display())]
  MissingOutput { path: PathBuf },

  #[error("vmlinux not found at {}; build the kernel first", path.display())]
  MissingVmlinux { path: PathBuf },

  #[error("failed to walk {}: {source}", path.display())]
  Walk { path: PathBuf, source: walkdir::Error },

  #[error(transparent)]
  Exec(#[from] ExecError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectEntry {
  /// Source file the object was compiled from, relative to the output dir.
  pub name: String,
  pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolEntry {
  pub name: String,
  pub kind: char,
  pub size: u64,
}

fn is_reported_object(path: &Path) -> bool {
  let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
    return false;
  };
  name.ends_with(".o") && !name.ends_with(".mod.o") && !AGGREGATE_OBJECTS.contains(&name)
}

/// `dir/file.o` → `dir/file.c`
fn source_name(relative: &Path) -> String {
  let mut name = relative
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/");
  name.truncate(name.len() - 1);
  name.push('c');
  name
}

/// Largest compiled objects under the output directory.
pub fn object_size_report(ctx: &BuildContext, limit: usize) -> Result<Vec<ObjectEntry>, InspectError> {
  let out = ctx.out_dir();
  if !out.is_dir() {
    return Err(InspectError::MissingOutput { path: out });
  }

  let mut entries = Vec::new();
  for entry in WalkDir::new(&out) {
    let entry = entry.map_err(|source| InspectError::Walk {
      path: out.clone(),
      source,
    })?;
    if !entry.file_type().is_file() || !is_reported_object(entry.path()) {
      continue;
    }
    let size = entry
      .metadata()
      .map_err(|source| InspectError::Walk {
        path: entry.path().to_path_buf(),
        source,
      })?
      .len();
    let relative = entry.path().strip_prefix(&out).unwrap_or(entry.path());
    entries.push(ObjectEntry {
      name: source_name(relative),
      size,
    });
  }

  debug!(objects = entries.len(), "scanned build output");
  entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
  entries.truncate(limit);
  Ok(entries)
}

/// Parse `nm --print-size` output. Lines without a size column (undefined
/// symbols) are skipped.
pub fn parse_nm(output: &str) -> Vec<SymbolEntry> {
  output
    .lines()
    .filter_map(|line| {
      let mut columns = line.split_whitespace();
      let _address = columns.next()?;
      let size = u64::from_str_radix(columns.next()?, 16).ok()?;
      let kind = columns.next()?.chars().next()?;
      let name = columns.next()?;
      Some(SymbolEntry {
        name: name.to_string(),
        kind,
        size,
      })
    })
    .collect()
}

/// Largest symbols in `vmlinux`, excluding uninitialized data (`b`/`B`).
pub fn symbol_size_report<R: CommandRunner + ?Sized>(
  ctx: &BuildContext,
  runner: &R,
  limit: usize,
) -> Result<Vec<SymbolEntry>, InspectError> {
  let vmlinux = ctx.vmlinux();
  if !vmlinux.is_file() {
    return Err(InspectError::MissingVmlinux { path: vmlinux });
  }

  let output = runner.output(
    &Invocation::new(&ctx.config().tools.nm)
      .args(["--print-size", "--size-sort", "--reverse-sort"])
      .arg(vmlinux.to_string_lossy()),
  )?;

  let mut symbols: Vec<SymbolEntry> = parse_nm(&output)
    .into_iter()
    .filter(|symbol| !matches!(symbol.kind, 'b' | 'B'))
    .collect();
  symbols.sort_by(|a, b| b.size.cmp(&a.size));
  symbols.truncate(limit);
  Ok(symbols)
}
