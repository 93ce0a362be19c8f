use std::{
    error::Error,
    io,
    path::Path,
    process::{Command, Output},
    str,
};

const MONADC_PATH: &str = "./target/debug/monadc";
const OUTPUT_PATH: &str = "./output";

pub struct Expected<'a> {
    pub stdout: &'a str,
    pub stderr: &'a str,
}

impl<'a> Expected<'a> {
    fn assert_matches(self, output: &Output) -> Result<(), Box<dyn Error>> {
        assert_eq!(str::from_utf8(&output.stdout)?, self.stdout);
        assert_eq!(str::from_utf8(&output.stderr)?, self.stderr);
        Ok(())
    }
}

fn run_compiler(src_path: &Path, out_path: &Path) -> Result<Output, io::Error> {
    Command::new(MONADC_PATH).arg(src_path).arg("-o").arg(out_path).output()
}

/// Compiles `src_path` with `monadc`, runs the resulting executable, and
/// asserts its stdout/stderr against `expected`.
pub fn check_compilation(src_path: &Path, expected: Expected) -> Result<(), Box<dyn Error>> {
    let out_path = Path::new(OUTPUT_PATH).join(src_path.file_stem().unwrap());
    std::fs::create_dir_all(OUTPUT_PATH)?;

    let compile_output = run_compiler(src_path, &out_path)?;
    let compile_stdout = std::str::from_utf8(&compile_output.stdout)?;
    let compile_stderr = std::str::from_utf8(&compile_output.stderr)?;

    println!("{compile_stdout}");
    assert!(compile_stderr.is_empty(), "{}", compile_stderr);
    assert!(
        compile_output.status.success(),
        "monadc exited with status {:?}",
        compile_output.status.code()
    );

    let output = Command::new(&out_path).output()?;

    expected.assert_matches(&output)?;
    assert!(
        output.status.success(),
        "compiled program exited with status {:?}",
        output.status.code()
    );

    Ok(())
}

/// Compiles `src_path` and asserts the compilation fails (non-zero exit,
/// diagnostic on stderr). Used for lexical, syntactic, reference, arity, and
/// type error scenarios.
pub fn check_failing_compilation(src_path: &Path) -> Result<(), Box<dyn Error>> {
    let out_path = Path::new(OUTPUT_PATH).join(src_path.file_stem().unwrap());
    std::fs::create_dir_all(OUTPUT_PATH)?;

    let compile_output = run_compiler(src_path, &out_path)?;
    let compile_stderr = std::str::from_utf8(&compile_output.stderr)?;

    println!("{compile_stderr}");
    assert!(
        !compile_output.status.success(),
        "monadc should have failed to compile {}",
        src_path.display()
    );
    assert!(!compile_stderr.is_empty(), "expected a diagnostic on stderr");

    Ok(())
}
