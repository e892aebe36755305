/// Per-test generator session
use crate::config::env::{EnvResolver, ProcessEnv, JJS_RANDOM_SEED, JJS_TEST, JJS_TEST_ID};
use crate::config::types::{Result, TestId};
use crate::random::generator::{Generator, Seed, SeedWidth};
use crate::random::global;
use crate::utils::fatal::OrFatal;
use crate::utils::fd::{open_fd, FdMode};
use std::fs::File;
use std::os::unix::io::RawFd;

/// How the session is resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestgenOptions {
    /// Wrap the output descriptor in a `File` instead of handing out the number
    pub open_output: bool,
    pub seed_width: SeedWidth,
}

impl Default for TestgenOptions {
    fn default() -> Self {
        Self {
            open_output: true,
            seed_width: SeedWidth::Full,
        }
    }
}

/// Destination for generated test data
#[derive(Debug)]
pub enum TestOutput {
    File(File),
    /// Validated descriptor number, still owned by the caller
    Fd(RawFd),
}

impl TestOutput {
    /// Open the destination as a stream, taking ownership of a raw descriptor
    pub fn into_file(self) -> Result<File> {
        match self {
            TestOutput::File(file) => Ok(file),
            TestOutput::Fd(fd) => open_fd(fd, FdMode::Write),
        }
    }
}

/// Values handed to a test generator by the executor
#[derive(Debug)]
pub struct TestgenEnv {
    pub test_id: TestId,
    pub output: TestOutput,
    pub seed: Seed,
}

impl TestgenEnv {
    pub fn resolve<F>(env: &EnvResolver<F>, opts: TestgenOptions) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let test_id = env.uint(JJS_TEST_ID)?;
        let output = if opts.open_output {
            TestOutput::File(env.descriptor(JJS_TEST, FdMode::Write)?)
        } else {
            TestOutput::Fd(env.descriptor_number(JJS_TEST, FdMode::Write)?)
        };
        let seed = Seed::from_bytes(&env.hex_bytes(JJS_RANDOM_SEED)?, opts.seed_width)?;
        Ok(TestgenEnv {
            test_id,
            output,
            seed,
        })
    }
}

/// One generated test: its id, where to write it and its generator
#[derive(Debug)]
pub struct TestgenSession {
    pub test_id: TestId,
    pub output: TestOutput,
    generator: Generator,
}

impl TestgenSession {
    pub fn new(env: TestgenEnv) -> Self {
        TestgenSession {
            test_id: env.test_id,
            output: env.output,
            generator: Generator::new(&env.seed),
        }
    }

    pub fn generator(&mut self) -> &mut Generator {
        &mut self.generator
    }

    pub fn into_parts(self) -> (TestId, TestOutput, Generator) {
        (self.test_id, self.output, self.generator)
    }
}

/// Initialize a generator process with a 32-byte seed.
///
/// Exits on bad configuration or when called twice.
pub fn init(open_output: bool) -> TestgenSession {
    init_with(TestgenOptions {
        open_output,
        ..TestgenOptions::default()
    })
}

pub fn init_with(opts: TestgenOptions) -> TestgenSession {
    let env = TestgenEnv::resolve(&ProcessEnv::process(), opts).or_fatal();
    let session = TestgenSession::new(env);
    // The global copy starts from the same state as the session's own.
    global::install(session.generator.clone()).or_fatal();
    log::info!("testgen initialized for test {}", session.test_id);
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RandomSource;
    use nix::unistd::dup;
    use std::collections::HashMap;
    use std::io::Write;
    use std::os::fd::AsRawFd;

    fn resolver(vars: Vec<(&'static str, String)>) -> EnvResolver<impl Fn(&str) -> Option<String>> {
        let map: HashMap<&'static str, String> = vars.into_iter().collect();
        EnvResolver::new(move |name: &str| map.get(name).cloned())
    }

    fn output_fd(dir: &tempfile::TempDir) -> RawFd {
        let file = File::create(dir.path().join("test.txt")).unwrap();
        dup(file.as_raw_fd()).unwrap()
    }

    #[test]
    fn test_resolve_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let fd = output_fd(&dir);
        let env = resolver(vec![
            (JJS_TEST_ID, "3".to_string()),
            (JJS_TEST, fd.to_string()),
            (JJS_RANDOM_SEED, "ab".repeat(32)),
        ]);
        let resolved = TestgenEnv::resolve(&env, TestgenOptions::default()).unwrap();
        assert_eq!(resolved.test_id, 3);
        assert_eq!(resolved.seed, Seed::Full([0xab; 32]));

        let mut session = TestgenSession::new(resolved);
        let value = session.generator().next_range(10, 20);
        assert!((10..20).contains(&value));

        let (_, output, _) = session.into_parts();
        let mut file = output.into_file().unwrap();
        writeln!(file, "{}", value).unwrap();
        drop(file);
        let written = std::fs::read_to_string(dir.path().join("test.txt")).unwrap();
        assert_eq!(written, format!("{}\n", value));
    }

    #[test]
    fn test_raw_descriptor_output() {
        let dir = tempfile::tempdir().unwrap();
        let fd = output_fd(&dir);
        let env = resolver(vec![
            (JJS_TEST_ID, "1".to_string()),
            (JJS_TEST, fd.to_string()),
            (JJS_RANDOM_SEED, "00".repeat(8)),
        ]);
        let opts = TestgenOptions {
            open_output: false,
            seed_width: SeedWidth::Compact,
        };
        let resolved = TestgenEnv::resolve(&env, opts).unwrap();
        match resolved.output {
            TestOutput::Fd(got) => assert_eq!(got, fd),
            TestOutput::File(_) => panic!("expected raw descriptor"),
        }
        assert_eq!(resolved.seed.width(), SeedWidth::Compact);
        nix::unistd::close(fd).unwrap();
    }

    #[test]
    fn test_seed_length_must_match_width() {
        let dir = tempfile::tempdir().unwrap();
        let fd = output_fd(&dir);
        let env = resolver(vec![
            (JJS_TEST_ID, "1".to_string()),
            (JJS_TEST, fd.to_string()),
            (JJS_RANDOM_SEED, "00".repeat(8)),
        ]);
        // Keep the descriptor unowned so the test can close it itself.
        let opts = TestgenOptions {
            open_output: false,
            seed_width: SeedWidth::Full,
        };
        let err = TestgenEnv::resolve(&env, opts).unwrap_err();
        assert!(err.to_string().contains("8 instead of 32"));
        nix::unistd::close(fd).unwrap();
    }

    #[test]
    fn test_same_seed_same_session_output() {
        let seed = Seed::Full([5; 32]);
        let make = || {
            TestgenSession::new(TestgenEnv {
                test_id: 1,
                output: TestOutput::Fd(-1),
                seed: seed.clone(),
            })
        };
        let mut a = make();
        let mut b = make();
        for _ in 0..16 {
            assert_eq!(a.generator().next_u64(), b.generator().next_u64());
        }
    }

    #[test]
    fn test_missing_test_id() {
        let env = resolver(vec![(JJS_RANDOM_SEED, "00".repeat(32))]);
        assert!(TestgenEnv::resolve(&env, TestgenOptions::default()).is_err());
    }
}
