use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use tempfile::tempdir;
use texdep_cli::world::SystemWorld;
use texdep_ide::{FileSet, Registry, World, analyze};
use texdep_syntax::FileId;

/// Executes a command with the texdep CLI.
fn exec() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_texdep"));
    command.env_remove("TEXDEP_ROOT").env_remove("TEXDEP_REGISTRY");
    command
}

const ARTICLE: &str = "\\documentclass{article}\n\\usepackage{amsmath}\n\
                       \\begin{document}\n\\includegraphics{cat}\n\\url{x}\n\\end{document}\n";

fn write(dir: &Path, name: &str, text: &str) -> io::Result<()> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)
}

#[test]
fn test_help() -> io::Result<()> {
    let output = exec().arg("--help").output()?;
    let stdout = std::str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("Reports commands and environments with missing imports"));
    assert!(stdout.contains("Adds the missing imports to the documents"));
    Ok(())
}

#[test]
fn test_check_reports_violations() -> io::Result<()> {
    let tmp = tempdir()?;
    write(tmp.path(), "main.tex", ARTICLE)?;

    let output = exec().arg("check").arg(tmp.path().join("main.tex")).output()?;
    assert!(!output.status.success());
    let stderr = std::str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("Command requires graphicx package"));
    assert!(stderr.contains("hint: Add import for package 'graphicx'"));
    assert!(stderr.contains("Command requires url package"));
    assert!(!stderr.contains("amsmath package"));
    Ok(())
}

#[test]
fn test_check_short_format() -> io::Result<()> {
    let tmp = tempdir()?;
    write(tmp.path(), "main.tex", "\\documentclass{article}\n\\href{a}{b}\n")?;

    let output = exec()
        .arg("check")
        .arg("--diagnostic-format=short")
        .arg(tmp.path().join("main.tex"))
        .output()?;
    assert!(!output.status.success());
    let stderr = std::str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("main.tex:2:1: error: Command requires hyperref package"));
    Ok(())
}

#[test]
fn test_check_clean_document() -> io::Result<()> {
    let tmp = tempdir()?;
    write(tmp.path(), "main.tex", "\\documentclass{article}\n\\section{Intro}\n")?;
    let status = exec().arg("check").arg(tmp.path().join("main.tex")).status()?;
    assert!(status.success());
    Ok(())
}

#[test]
fn test_check_missing_input() -> io::Result<()> {
    let tmp = tempdir()?;
    let output = exec().arg("check").arg(tmp.path().join("nope.tex")).output()?;
    assert!(!output.status.success());
    let stderr = std::str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("error: input file not found"));
    Ok(())
}

#[test]
fn test_fix_inserts_imports() -> io::Result<()> {
    let tmp = tempdir()?;
    let main = tmp.path().join("main.tex");
    write(tmp.path(), "main.tex", ARTICLE)?;

    let output = exec().arg("fix").arg(&main).output()?;
    assert!(output.status.success());
    let stdout = std::str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("Add import for package 'graphicx'"));
    assert!(stdout.contains("Add import for package 'url'"));

    assert_eq!(
        fs::read_to_string(&main)?,
        "\\documentclass{article}\n\\usepackage{amsmath}\n\\usepackage{graphicx}\n\
         \\usepackage{url}\n\\begin{document}\n\\includegraphics{cat}\n\\url{x}\n\
         \\end{document}\n"
    );

    // Fixing again changes nothing.
    let output = exec().arg("fix").arg(&main).output()?;
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(exec().arg("check").arg(&main).status()?.success());
    Ok(())
}

#[test]
fn test_fix_dry_run() -> io::Result<()> {
    let tmp = tempdir()?;
    let main = tmp.path().join("main.tex");
    write(tmp.path(), "main.tex", ARTICLE)?;

    let output = exec().arg("fix").arg("--dry-run").arg(&main).output()?;
    assert!(output.status.success());
    assert!(!output.stdout.is_empty());
    assert_eq!(fs::read_to_string(&main)?, ARTICLE);
    Ok(())
}

#[test]
fn test_fix_unfixable() -> io::Result<()> {
    let tmp = tempdir()?;
    let main = tmp.path().join("main.tex");
    write(tmp.path(), "main.tex", "\\url{x}\n")?;

    let output = exec().arg("fix").arg(&main).output()?;
    assert!(!output.status.success());
    assert_eq!(fs::read_to_string(&main)?, "\\url{x}\n");
    let stderr = std::str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("Command requires url package"));
    Ok(())
}

#[test]
fn test_fix_included_file() -> io::Result<()> {
    let tmp = tempdir()?;
    let main = tmp.path().join("main.tex");
    write(tmp.path(), "main.tex", "\\documentclass{book}\n\\include{chapters/one}\n")?;
    write(tmp.path(), "chapters/one.tex", "\\usepackage{xcolor}\n\\url{x}\n")?;

    let status = exec().arg("fix").arg(&main).status()?;
    assert!(status.success());
    assert_eq!(
        fs::read_to_string(tmp.path().join("chapters/one.tex"))?,
        "\\usepackage{xcolor}\n\\usepackage{url}\n\\url{x}\n"
    );
    Ok(())
}

#[test]
fn test_packages() -> io::Result<()> {
    let tmp = tempdir()?;
    let main = tmp.path().join("main.tex");
    write(tmp.path(), "main.tex", "\\usepackage{a,b}\n\\input{more}\n")?;
    write(tmp.path(), "more.tex", "\\usepackage[opt]{c}\n")?;

    let output = exec().arg("packages").arg(&main).output()?;
    assert!(output.status.success());
    assert_eq!(std::str::from_utf8(&output.stdout).unwrap(), "a\nb\nc\n");
    Ok(())
}

#[test]
fn test_inject() -> io::Result<()> {
    let tmp = tempdir()?;
    let main = tmp.path().join("main.tex");
    write(tmp.path(), "main.tex", "x\n\\begin{lstlisting}\nprint(1)\n\\end{lstlisting}\n")?;

    let status = exec()
        .args(["inject", "--offset", "5", "--language", "python"])
        .arg(&main)
        .status()?;
    assert!(status.success());
    assert_eq!(
        fs::read_to_string(&main)?,
        "x\n%! language = python\n\\begin{lstlisting}\nprint(1)\n\\end{lstlisting}\n"
    );

    let output = exec()
        .args(["inject", "--offset", "0", "--language", "python"])
        .arg(&main)
        .output()?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn test_registry_file() -> io::Result<()> {
    let tmp = tempdir()?;
    let main = tmp.path().join("main.tex");
    write(tmp.path(), "main.tex", "\\documentclass{article}\n\\foo\n")?;
    write(tmp.path(), "registry.toml", "[commands.\"\\\\foo\"]\npackage = \"foopkg\"\n")?;

    let output = exec()
        .arg("check")
        .arg("--registry")
        .arg(tmp.path().join("registry.toml"))
        .arg(&main)
        .output()?;
    assert!(!output.status.success());
    let stderr = std::str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("Command requires foopkg package"));

    write(tmp.path(), "broken.toml", "[commands.foo]\npackages = 1\n")?;
    let output = exec()
        .arg("check")
        .arg(&main)
        .env("TEXDEP_REGISTRY", tmp.path().join("broken.toml"))
        .output()?;
    let stderr = std::str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("error: failed to parse registry"));
    Ok(())
}

#[test]
fn test_fix_rejects_unimportable_registry_package() -> io::Result<()> {
    let tmp = tempdir()?;
    let main = tmp.path().join("main.tex");
    let text = "\\documentclass{article}\n\\foo\n";
    write(tmp.path(), "main.tex", text)?;
    write(tmp.path(), "registry.toml", "[commands.\"\\\\foo\"]\npackage = \"a,b\"\n")?;

    let output = exec()
        .arg("fix")
        .arg("--registry")
        .arg(tmp.path().join("registry.toml"))
        .arg(&main)
        .output()?;
    assert!(!output.status.success());
    let stderr = std::str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("package name \"a,b\" contains ','"));
    assert_eq!(fs::read_to_string(&main)?, text);
    Ok(())
}

#[test]
fn test_system_world() -> io::Result<()> {
    let tmp = tempdir()?;
    write(tmp.path(), "src/main.tex", "\\input{../shared/defs}\\input{missing}\\url{x}")?;
    write(tmp.path(), "shared/defs.tex", "\\usepackage{url}")?;

    let main_path = tmp.path().join("src/main.tex");
    let world = SystemWorld::with_root(&main_path, Some(tmp.path())).unwrap();
    assert_eq!(world.main(), FileId::new("src/main.tex"));

    let main = world.document(world.main()).unwrap();
    let set = FileSet::extract(&world, &main);
    assert_eq!(set.files(), [FileId::new("src/main.tex"), FileId::new("shared/defs.tex")]);
    assert!(analyze(&world, &Registry::builtin(), &main).is_empty());

    assert!(world.document(FileId::new("missing.tex")).is_err());
    let shared = tmp.path().join("shared");
    assert!(SystemWorld::with_root(&main_path, Some(shared.as_path())).is_err());
    Ok(())
}
