use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(temp_str) = std::env::var("DRAFTSMITH_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=2.0).contains(&temp)
        {
            self.refinement.temperature = temp;
        }

        if let Ok(count_str) = std::env::var("DRAFTSMITH_MAX_ALTERNATIVES")
            && let Ok(count) = count_str.parse::<usize>()
            && count > 0
        {
            self.refinement.max_alternatives = count;
        }

        if let Ok(level) = std::env::var("DRAFTSMITH_LOG_LEVEL")
            && !level.is_empty()
        {
            self.log_level = level;
        }

        if let Ok(backend) = std::env::var("DRAFTSMITH_OBSERVABILITY")
            && !backend.is_empty()
        {
            self.observability.backend = backend;
        }
    }
}
