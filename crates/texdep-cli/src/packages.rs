use texdep_ide::diag::StrResult;
use texdep_ide::{FileSet, World, included_packages};

use crate::args::PackagesCommand;
use crate::world::SystemWorld;

/// Execute a package listing command.
pub fn packages(command: &PackagesCommand) -> StrResult<()> {
    let world = SystemWorld::new(&command.common)?;
    let main = world.document(world.main())?;
    let set = FileSet::extract(&world, &main);

    for name in included_packages(set.commands()) {
        println!("{name}");
    }

    Ok(())
}
