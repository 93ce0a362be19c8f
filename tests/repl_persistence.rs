use std::error::Error;
use std::io::Write;
use std::process::{Command, Stdio};

const MONAD_REPL_PATH: &str = "./target/debug/monad-repl";

/// Drives `monad-repl` as a subprocess the same way `test-utils` drives
/// `monadc`, piping a fixed script into its stdin and collecting whatever
/// it wrote to stdout/stderr before exiting on EOF.
fn run_repl_script(script: &str) -> Result<(String, String), Box<dyn Error>> {
    let history_path = std::env::temp_dir().join(format!("monad_repl_test_history_{}", std::process::id()));

    let mut child = Command::new(MONAD_REPL_PATH)
        .arg("--history")
        .arg(&history_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("child stdin was piped");
    stdin.write_all(script.as_bytes())?;
    drop(stdin); // EOF: the REPL's readline loop exits the same way Ctrl-D does.

    let output = child.wait_with_output()?;
    let _ = std::fs::remove_file(&history_path);

    Ok((
        String::from_utf8(output.stdout)?,
        String::from_utf8(output.stderr)?,
    ))
}

/// Scenario S6 / property P7: a `define`d variable is stored as a module
/// global, not a stack alloca, so it survives past the wrapper function it
/// was defined in and is visible to a later, independently JIT-compiled
/// `__repl_expr_N` wrapper.
#[test]
fn repl_persists_defined_variable_across_expressions() -> Result<(), Box<dyn Error>> {
    let (stdout, stderr) = run_repl_script("(define n 41)\n(+ n 1)\n")?;

    assert!(stderr.is_empty(), "unexpected diagnostics on stderr: {stderr}");
    assert!(stdout.contains("n :: Int"), "missing define echo, stdout was: {stdout}");
    assert!(stdout.contains("42"), "missing persisted-value result, stdout was: {stdout}");

    Ok(())
}

/// A malformed line (unclosed list) must not end the session — the REPL
/// renders the diagnostic and returns to the prompt, so an expression
/// entered afterward still evaluates normally.
#[test]
fn repl_survives_a_malformed_line() -> Result<(), Box<dyn Error>> {
    let (stdout, stderr) = run_repl_script("(+ 1 2\n(show (+ 1 2))\n")?;

    assert!(stderr.contains("error:"), "expected a diagnostic for the unclosed list, stderr was: {stderr}");
    assert!(stdout.contains('3'), "session should have continued past the bad line, stdout was: {stdout}");

    Ok(())
}
