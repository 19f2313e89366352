mod options;

#[cfg(test)]
pub(super) struct Fixture {
    _dir: tempfile::TempDir,
    pub source_config: String,
    pub id_list: String,
    pub tmp_dir: String,
}

#[cfg(test)]
impl Fixture {
    pub fn new() -> Self {
        Self::with_source_config(
            "AWS_ACCESS_KEY_ID: source_access_key\n\
             AWS_SECRET_ACCESS_KEY: source_secret_access_key\n\
             AWS_REGION: us-east-1\n\
             AWS_ENDPOINT_URL: https://swift.example.org\n\
             FORCE_PATH_STYLE: true\n",
        )
    }

    pub fn with_source_config(content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let source_config = dir.path().join("source.yaml");
        std::fs::write(&source_config, content).unwrap();
        let id_list = dir.path().join("ids.txt");
        std::fs::write(&id_list, "a:1\na:2\n").unwrap();

        Self {
            source_config: source_config.to_string_lossy().to_string(),
            id_list: id_list.to_string_lossy().to_string(),
            tmp_dir: dir.path().to_string_lossy().to_string(),
            _dir: dir,
        }
    }

    pub fn path(&self, name: &str) -> String {
        std::path::Path::new(&self.tmp_dir)
            .join(name)
            .to_string_lossy()
            .to_string()
    }

    pub fn args(&self, subcommand: &str, extra: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = [
            "s3migrate",
            subcommand,
            "--source-config",
            &self.source_config,
            "--id-list",
            &self.id_list,
            "--tmp-dir",
            &self.tmp_dir,
            "--container-src",
            "CWRC",
            "--container-dst",
            "cwrc",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect();

        args.extend(extra.iter().map(|arg| arg.to_string()));
        args
    }
}
