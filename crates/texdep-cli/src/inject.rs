use texdep_ide::diag::{StrResult, bail};
use texdep_ide::{World, inject_language};

use crate::args::InjectCommand;
use crate::world::SystemWorld;

/// Execute a language injection command.
pub fn inject(command: &InjectCommand) -> StrResult<()> {
    let world = SystemWorld::new(&command.common)?;
    let mut document = world.document(world.main())?;

    let Some(edit) = inject_language(&document, command.offset, &command.language) else {
        bail!(
            "cannot inject {:?}: no environment begins at offset {}",
            command.language,
            command.offset
        );
    };

    edit.apply(&mut document)?;
    world.write(&document)
}
