use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("znpwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: znpwire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("ZNPWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: schema={}, async={}, cli=true",
        cfg!(feature = "schema"),
        cfg!(feature = "async")
    );
    match znpwire_schema::CommandCatalog::builtin() {
        Ok(catalog) => println!("builtin_commands: {}", catalog.len()),
        Err(err) => println!("builtin_commands: unavailable ({err})"),
    }

    Ok(SUCCESS)
}
