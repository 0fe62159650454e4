use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_delivery_mode,
    parse_environment, parse_u32, parse_u64, parse_upload_backend,
};
use super::types::{
    ConfigError, CorsSettings, DeliveryMode, DeliverySettings, QuizSettings, RelaySettings,
    RuntimeSettings, S3Settings, ServerHost, ServerPort, ServerSettings, Settings,
    TelemetrySettings, UploadBackend, UploadSettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("QUIZ_HOST", "127.0.0.1");
        let port = env_or_default("QUIZ_PORT", "8080");

        let environment =
            parse_environment(env_optional("QUIZ_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("QUIZ_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let questions_source = env_or_default("QUESTIONS_SOURCE", "questions.json");
        let questions_load_retries =
            parse_u32("QUESTIONS_LOAD_RETRIES", env_or_default("QUESTIONS_LOAD_RETRIES", "0"))?;
        let test_duration_seconds =
            parse_u64("TEST_DURATION_SECONDS", env_or_default("TEST_DURATION_SECONDS", "3600"))?;

        let mode = parse_delivery_mode(env_optional("DELIVERY_MODE"))?;
        let export_dir = env_or_default("EXPORT_DIR", "exports");
        let timeout_seconds = parse_u64(
            "DELIVERY_TIMEOUT_SECONDS",
            env_or_default("DELIVERY_TIMEOUT_SECONDS", "20"),
        )?;

        let backend = parse_upload_backend(env_optional("UPLOAD_BACKEND"))?;
        let upload_endpoint =
            env_or_default("UPLOAD_ENDPOINT", "https://upload.uploadcare.com/base/");
        let upload_public_key = env_or_default("UPLOAD_PUBLIC_KEY", "");
        let upload_cdn_base = env_or_default("UPLOAD_CDN_BASE", "https://ucarecdn.com");

        let s3_endpoint = env_or_default("S3_ENDPOINT", "https://s3.amazonaws.com");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "quiz-answers");
        let s3_region = env_or_default("S3_REGION", "us-east-1");
        let link_expire_minutes = parse_u64(
            "S3_LINK_EXPIRE_MINUTES",
            env_or_default("S3_LINK_EXPIRE_MINUTES", "10080"),
        )?;

        let relay_endpoint = env_optional("RELAY_ENDPOINT");
        let contact_email = env_or_default("CONTACT_EMAIL", "support@example.com");
        let thank_you_template = env_or_default(
            "THANK_YOU_TEMPLATE",
            "Thank you, {name}! Your report will be shared soon.",
        );

        let log_level = env_or_default("QUIZ_LOG_LEVEL", "info");
        let json = env_optional("QUIZ_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            cors: CorsSettings { origins: cors_origins },
            quiz: QuizSettings { questions_source, questions_load_retries, test_duration_seconds },
            delivery: DeliverySettings { mode, export_dir, timeout_seconds },
            upload: UploadSettings {
                backend,
                endpoint: upload_endpoint,
                public_key: upload_public_key,
                cdn_base: upload_cdn_base,
            },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
                link_expire_minutes,
            },
            relay: RelaySettings { endpoint: relay_endpoint, contact_email, thank_you_template },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn quiz(&self) -> &QuizSettings {
        &self.quiz
    }

    pub(crate) fn delivery(&self) -> &DeliverySettings {
        &self.delivery
    }

    pub(crate) fn upload(&self) -> &UploadSettings {
        &self.upload
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn relay(&self) -> &RelaySettings {
        &self.relay
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.quiz.test_duration_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "TEST_DURATION_SECONDS",
                value: String::from("0"),
            });
        }

        if self.delivery.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DELIVERY_TIMEOUT_SECONDS",
                value: String::from("0"),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.delivery.mode == DeliveryMode::Upload {
            if self.relay.endpoint.is_none() {
                return Err(ConfigError::MissingSecret("RELAY_ENDPOINT"));
            }

            match self.upload.backend {
                UploadBackend::Direct if self.upload.public_key.is_empty() => {
                    return Err(ConfigError::MissingSecret("UPLOAD_PUBLIC_KEY"));
                }
                UploadBackend::S3
                    if self.s3.access_key.is_empty() || self.s3.secret_key.is_empty() =>
                {
                    return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
                }
                _ => {}
            }
        }

        Ok(())
    }
}
