use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("dictable {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: dictable");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("DICTABLE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("DICTABLE_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "rustc: {}",
        option_env!("DICTABLE_RUSTC_VERSION").unwrap_or("unknown")
    );
    println!(
        "git_hash: {}",
        option_env!("DICTABLE_GIT_HASH").unwrap_or("unknown")
    );
    println!(
        "features: schema={}, document={}, cli=true",
        cfg!(feature = "schema"),
        cfg!(feature = "document")
    );

    Ok(SUCCESS)
}
