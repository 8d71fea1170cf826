use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::RuntimeError,
    interpreter::{
        environment::Env,
        evaluator::core::{Context, EvalResult},
        lexer::tokenize,
        parser::core::parse_program,
        runtime::core::ImportState,
        value::core::Value,
    },
};

impl Context {
    /// Runs `import "path" [as alias]`.
    ///
    /// Relative paths resolve against the directory of the importing script
    /// (or the working directory for scripts that did not come from a file).
    /// A file runs once per runtime, in a fresh top-level scope; later
    /// imports reuse its exports. The exports are the names the file
    /// declared at its top level. Without an alias they are copied into the
    /// importing scope, with one they are gathered into a map bound to the
    /// alias.
    ///
    /// ## Errors
    /// - `CyclicImport` if the file is still loading further up the chain.
    /// - `ImportFailed` if it cannot be read or parsed.
    /// - Any runtime error raised while the file runs.
    pub(crate) fn exec_import(&self,
                              path: &str,
                              alias: Option<&str>,
                              line: usize,
                              env: &Env)
                              -> EvalResult<()> {
        let resolved = resolve_import_path(path, env.dir());

        let state = self.runtime().imports.lock().begin(&resolved);
        let exports = match state {
            ImportState::Loaded(exports) => exports,
            ImportState::Cycle => {
                return Err(RuntimeError::CyclicImport { path: resolved.display().to_string(),
                                                        line });
            },
            ImportState::Started => {
                debug!(path = %resolved.display(), "loading module");
                match self.load_module(path, &resolved, line) {
                    Ok(exports) => {
                        self.runtime().imports.lock().finish(&resolved, exports.clone());
                        exports
                    },
                    Err(error) => {
                        self.runtime().imports.lock().abort(&resolved);
                        return Err(error);
                    },
                }
            },
        };

        match alias {
            Some(alias) => env.define(alias, Value::from(exports.into_iter().collect::<BTreeMap<_, _>>())),
            None => {
                for (name, value) in exports {
                    env.define(&name, value);
                }
            },
        }
        Ok(())
    }

    fn load_module(&self, written: &str, path: &Path, line: usize) -> EvalResult<Vec<(String, Value)>> {
        let failed = |details: String| RuntimeError::ImportFailed { path: written.to_string(),
                                                                    details,
                                                                    line };

        let source = fs::read_to_string(path).map_err(|e| failed(e.to_string()))?;
        let program = tokenize(&source).and_then(|tokens| parse_program(&tokens))
                                       .map_err(|e| failed(e.to_string()))?;

        let module_env = self.global_env(path.parent().map(Path::to_path_buf));
        Self::finish_completion(self.exec_statements(&program.statements, &module_env)?)?;

        Ok(module_env.own_bindings())
    }
}

/// Joins `path` onto `base` (or the working directory) and canonicalizes it
/// when the file exists, so one file imported under two spellings is still
/// recognised as the same module.
fn resolve_import_path(path: &str, base: Option<&Path>) -> PathBuf {
    let joined = match base {
        Some(dir) if Path::new(path).is_relative() => dir.join(path),
        _ => PathBuf::from(path),
    };
    fs::canonicalize(&joined).unwrap_or(joined)
}
