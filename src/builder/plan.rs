//! Build plan resolution.
//!
//! Given a target platform, the plan produces the generator name and the
//! configure/build/install commands, with any environment augmentation
//! (harvested from EMSDK activation) threaded through each command as an
//! explicit override map rather than mutated into the ambient process
//! environment.

use std::collections::HashMap;
use std::path::Path;

use crate::core::config::{BuildConfig, Platform};
use crate::util::process::ProcessBuilder;

/// The resolved three-phase command plan for one invocation.
#[derive(Debug)]
pub struct BuildPlan {
    config: BuildConfig,
    env: HashMap<String, String>,
}

impl BuildPlan {
    /// Resolve a plan for the given configuration and environment
    /// overrides.
    pub fn new(config: BuildConfig, env: HashMap<String, String>) -> Self {
        BuildPlan { config, env }
    }

    /// The CMake generator for this plan's platform.
    pub fn generator(&self) -> &'static str {
        self.config.platform.generator()
    }

    /// Environment overrides applied to every command in this plan.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// The configure command: `cmake -S <source> -B <build>`, wrapped
    /// with `emcmake` for the cross-compiled target.
    pub fn configure(&self) -> ProcessBuilder {
        let cfg = &self.config;
        let mut cmd = wrapped_cmake(cfg.platform)
            .arg("-S")
            .arg(&cfg.source)
            .arg("-B")
            .arg(&cfg.build_dir)
            .arg("-G")
            .arg(self.generator())
            .arg("-DCMAKE_BUILD_TYPE=Release")
            .arg(format!(
                "-DCMAKE_INSTALL_PREFIX={}",
                cfg.install_dir.display()
            ));

        for flag in &cfg.cmake_extra {
            cmd = cmd.arg(flag);
        }

        cmd.envs(&self.env)
    }

    /// The build command, with parallelism delegated to the build tool.
    pub fn build(&self) -> ProcessBuilder {
        ProcessBuilder::new("cmake")
            .arg("--build")
            .arg(&self.config.build_dir)
            .arg("--parallel")
            .arg(self.config.jobs.to_string())
            .envs(&self.env)
    }

    /// The install command.
    pub fn install(&self) -> ProcessBuilder {
        ProcessBuilder::new("cmake")
            .arg("--install")
            .arg(&self.config.build_dir)
            .arg("--prefix")
            .arg(&self.config.install_dir)
            .envs(&self.env)
    }

    /// Configure command for a nested project (the smoke test), built
    /// against an already-installed tree via `CMAKE_PREFIX_PATH`.
    pub fn configure_nested(&self, source: &Path, build: &Path, prefix: &Path) -> ProcessBuilder {
        let mut cmd = wrapped_cmake(self.config.platform)
            .arg("-S")
            .arg(source)
            .arg("-B")
            .arg(build)
            .arg("-G")
            .arg(self.generator())
            .arg("-DCMAKE_BUILD_TYPE=Release")
            .arg(format!("-DCMAKE_PREFIX_PATH={}", prefix.display()));

        for flag in &self.config.cmake_extra {
            cmd = cmd.arg(flag);
        }

        cmd.envs(&self.env)
    }

    /// Build command for a nested project.
    pub fn build_nested(&self, build: &Path) -> ProcessBuilder {
        ProcessBuilder::new("cmake")
            .arg("--build")
            .arg(build)
            .arg("--parallel")
            .arg(self.config.jobs.to_string())
            .envs(&self.env)
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }
}

/// `cmake`, wrapped with the Emscripten CMake wrapper when the platform
/// needs it.
fn wrapped_cmake(platform: Platform) -> ProcessBuilder {
    if platform.uses_emcmake() {
        ProcessBuilder::new("emcmake").arg("cmake")
    } else {
        ProcessBuilder::new("cmake")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(platform: Platform) -> BuildConfig {
        BuildConfig {
            platform,
            source: PathBuf::from("/src"),
            build_dir: PathBuf::from("/b"),
            install_dir: PathBuf::from("/i"),
            jobs: 2,
            dry_run: true,
            cmake_extra: vec![],
            emsdk_version: "3.1.45".to_string(),
            cache_dir: PathBuf::from("/cache"),
            use_gpu: false,
            detect_gpu: false,
            smoke_test: false,
            smoke_test_browser: false,
        }
    }

    #[test]
    fn test_linux_configure_shape() {
        let plan = BuildPlan::new(config(Platform::Linux), HashMap::new());
        let cmd = plan.configure();

        assert_eq!(cmd.get_program(), Path::new("cmake"));
        let args = cmd.get_args();
        assert_eq!(args[0], "-S");
        assert_eq!(args[1], "/src");
        assert_eq!(args[2], "-B");
        assert_eq!(args[3], "/b");
        assert!(args.contains(&"-G".to_string()));
        assert!(args.contains(&"Unix Makefiles".to_string()));
        assert!(args.contains(&"-DCMAKE_INSTALL_PREFIX=/i".to_string()));
    }

    #[test]
    fn test_emscripten_configure_is_wrapped() {
        let plan = BuildPlan::new(config(Platform::Emscripten), HashMap::new());
        let cmd = plan.configure();

        assert_eq!(cmd.get_program(), Path::new("emcmake"));
        assert_eq!(cmd.get_args()[0], "cmake");
        assert!(cmd.get_args().contains(&"Ninja".to_string()));
    }

    #[test]
    fn test_windows_placeholder_matches_unix_shape() {
        let linux = BuildPlan::new(config(Platform::Linux), HashMap::new());
        let windows = BuildPlan::new(config(Platform::Windows), HashMap::new());

        assert_eq!(
            linux.configure().display_command(),
            windows.configure().display_command()
        );
    }

    #[test]
    fn test_build_forwards_jobs() {
        let plan = BuildPlan::new(config(Platform::Linux), HashMap::new());
        let args = plan.build().get_args().to_vec();

        assert_eq!(args, vec!["--build", "/b", "--parallel", "2"]);
    }

    #[test]
    fn test_install_references_prefix() {
        let plan = BuildPlan::new(config(Platform::Linux), HashMap::new());
        let args = plan.install().get_args().to_vec();

        assert_eq!(args, vec!["--install", "/b", "--prefix", "/i"]);
    }

    #[test]
    fn test_extra_flags_appended_to_configure() {
        let mut cfg = config(Platform::Linux);
        cfg.cmake_extra = vec!["-DFOO=ON".to_string(), "-DBAR=OFF".to_string()];
        let plan = BuildPlan::new(cfg, HashMap::new());
        let args = plan.configure().get_args().to_vec();

        assert!(args.contains(&"-DFOO=ON".to_string()));
        assert!(args.contains(&"-DBAR=OFF".to_string()));
    }

    #[test]
    fn test_env_threaded_through_all_commands() {
        let mut env = HashMap::new();
        env.insert("EMSDK".to_string(), "/opt/emsdk".to_string());
        let plan = BuildPlan::new(config(Platform::Emscripten), env);

        assert_eq!(plan.configure().get_envs()["EMSDK"], "/opt/emsdk");
        assert_eq!(plan.build().get_envs()["EMSDK"], "/opt/emsdk");
        assert_eq!(plan.install().get_envs()["EMSDK"], "/opt/emsdk");
    }

    #[test]
    fn test_nested_configure_uses_prefix_path() {
        let plan = BuildPlan::new(config(Platform::Linux), HashMap::new());
        let cmd = plan.configure_nested(
            Path::new("/src/tests/smoke"),
            Path::new("/b/smoke"),
            Path::new("/i"),
        );

        let args = cmd.get_args();
        assert!(args.contains(&"-DCMAKE_PREFIX_PATH=/i".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("-DCMAKE_INSTALL_PREFIX")));
    }
}
