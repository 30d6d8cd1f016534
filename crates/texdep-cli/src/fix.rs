use codespan_reporting::files::Files;
use ecow::eco_format;
use rustc_hash::FxHashSet;
use texdep_ide::diag::StrResult;
use texdep_ide::{Fix, Registry, World, analyze, apply_fix};
use texdep_syntax::{Document, FileId};

use crate::args::{DiagnosticFormat, FixCommand};
use crate::check::print_diagnostics;
use crate::set_failed;
use crate::world::SystemWorld;

/// Execute a fix command.
///
/// Fixes are applied one at a time: after each one, the file set is
/// analyzed again, so that every package is imported exactly once. A fix is
/// applied at most once per file. Whatever cannot be fixed is reported as a
/// diagnostic.
pub fn fix(command: &FixCommand) -> StrResult<()> {
    let world = SystemWorld::new(&command.common)?;
    let registry = crate::registry::load(&command.common)?;

    let mut changed: Vec<FileId> = vec![];
    let mut applied = FxHashSet::default();
    while let Some((fix, document)) = next_fix(&world, &registry, &applied)? {
        let id = fix.target();
        let name = world.name(id).unwrap_or_else(|_| id.path().into());
        println!("{name}: {}", fix.description());

        world.update(document);
        if !changed.contains(&id) {
            changed.push(id);
        }
        applied.insert(fix);
    }

    if !command.dry_run {
        for &id in &changed {
            world.write(&world.document(id)?)?;
        }
    }

    let main = world.document(world.main())?;
    let remaining = analyze(&world, &registry, &main);
    if !remaining.is_empty() {
        set_failed();
        print_diagnostics(&world, &remaining, DiagnosticFormat::Human)
            .map_err(|err| eco_format!("failed to print diagnostics ({err})"))?;
    }

    Ok(())
}

/// Analyze the main document and apply the first fix that is applicable and
/// was not applied before.
fn next_fix(
    world: &SystemWorld,
    registry: &Registry,
    applied: &FxHashSet<Fix>,
) -> StrResult<Option<(Fix, Document)>> {
    let main = world.document(world.main())?;
    for violation in analyze(world, registry, &main) {
        let Some(fix) = violation.fix() else { continue };
        if applied.contains(&fix) {
            tracing::warn!("{} did not resolve its violation", fix.description());
            continue;
        }
        if let Some(document) = apply_fix(world, &fix)? {
            return Ok(Some((fix, document)));
        }
    }
    Ok(None)
}
