use znpwire_frame::Subsystem;

use crate::cmd::{CatalogArgs, Context};
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_catalog, print_command_def};

pub fn run(args: CatalogArgs, ctx: &Context) -> CliResult<i32> {
    let catalog = ctx.catalog()?;

    if let Some(name) = &args.command {
        let def = catalog
            .by_name(name)
            .ok_or_else(|| CliError::new(USAGE, format!("unknown command: {name}")))?;
        print_command_def(&def, ctx.format);
        return Ok(SUCCESS);
    }

    let subsystem = args
        .subsystem
        .as_deref()
        .map(str::parse::<Subsystem>)
        .transpose()
        .map_err(|err| CliError::new(USAGE, err.to_string()))?;

    let commands = catalog.commands();
    let selected = commands
        .iter()
        .filter(|def| subsystem.is_none_or(|sub| def.subsystem() == sub))
        .map(|def| def.as_ref());
    print_catalog(selected, ctx.format);
    Ok(SUCCESS)
}
