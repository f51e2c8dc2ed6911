//! Docker artifact generation.

use aifabrix_schema::AppConfig;
use anyhow::Result;

/// Generate a Dockerfile for an application.
pub fn generate_dockerfile(config: &AppConfig) -> Result<String> {
    let mut dockerfile = String::new();

    let base_image = match config.app.language.as_str() {
        "python" => "python:3.11-slim",
        "node" => "node:20-alpine",
        _ => "debian:bookworm-slim",
    };

    dockerfile.push_str(&format!(
        "# Dockerfile for {} (generated by aifabrix)\n\n",
        config.app.name
    ));
    dockerfile.push_str(&format!("FROM {}\n\n", base_image));
    dockerfile.push_str("WORKDIR /app\n\n");

    match config.app.language.as_str() {
        "python" => {
            dockerfile.push_str("COPY requirements.txt .\n");
            dockerfile.push_str("RUN pip install --no-cache-dir -r requirements.txt\n\n");
            dockerfile.push_str("COPY . .\n\n");
        }
        "node" => {
            dockerfile.push_str("COPY package.json .\n");
            dockerfile.push_str("RUN npm install --omit=dev\n\n");
            dockerfile.push_str("COPY . .\n\n");
        }
        _ => {
            dockerfile.push_str("COPY . .\n\n");
        }
    }

    dockerfile.push_str(&format!("ENV PORT={}\n", config.app.port));
    dockerfile.push_str(&format!("EXPOSE {}\n\n", config.app.port));

    dockerfile.push_str(&format!(
        "HEALTHCHECK --interval=10s --timeout=5s --retries=3 \\\n  CMD curl -f http://localhost:{}/health || exit 1\n\n",
        config.app.port
    ));

    match config.app.language.as_str() {
        "python" => dockerfile.push_str("CMD [\"python\", \"main.py\"]\n"),
        "node" => dockerfile.push_str("CMD [\"node\", \"server.js\"]\n"),
        _ => dockerfile.push_str("CMD [\"./start.sh\"]\n"),
    }

    Ok(dockerfile)
}

/// Generate docker-compose.yaml for an application and the backing
/// services it requires.
pub fn generate_compose(config: &AppConfig, host_port: Option<u16>) -> Result<String> {
    let mut compose = String::new();
    let app = &config.app.name;
    let port = config.app.port;
    let published = host_port.unwrap_or(port);

    compose.push_str("# Generated by aifabrix; do not hand-edit.\n\n");
    compose.push_str("services:\n");

    // Application service
    compose.push_str(&format!("  {}:\n", app));
    compose.push_str("    build:\n");
    compose.push_str("      context: .\n");
    compose.push_str("      dockerfile: Dockerfile\n");
    compose.push_str(&format!("    image: {}\n", config.image_name()));
    compose.push_str(&format!("    container_name: {}\n", app));
    compose.push_str("    ports:\n");
    compose.push_str(&format!("      - \"{}:{}\"\n", published, port));
    compose.push_str("    env_file:\n");
    compose.push_str("      - .env\n");

    let mut environment: Vec<(String, String)> = config
        .env
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    environment.push(("PORT".to_string(), port.to_string()));
    if config.requires.database {
        let first_db = config
            .databases
            .first()
            .map(|d| d.name.as_str())
            .unwrap_or(app.as_str());
        environment.push((
            "DATABASE_URL".to_string(),
            format!(
                "postgresql://pgadmin:${{POSTGRES_PASSWORD:-admin123}}@postgres:5432/{}",
                first_db
            ),
        ));
    }
    if config.requires.redis {
        environment.push(("REDIS_URL".to_string(), "redis://redis:6379".to_string()));
    }
    compose.push_str("    environment:\n");
    for (name, value) in &environment {
        compose.push_str(&format!("      {}: \"{}\"\n", name, value));
    }

    let mut depends: Vec<&str> = Vec::new();
    if config.requires.database {
        depends.push("db-init");
    }
    if config.requires.redis {
        depends.push("redis");
    }
    if !depends.is_empty() {
        compose.push_str("    depends_on:\n");
        for dep in &depends {
            compose.push_str(&format!("      {}:\n", dep));
            let condition = if *dep == "db-init" {
                "service_completed_successfully"
            } else {
                "service_healthy"
            };
            compose.push_str(&format!("        condition: {}\n", condition));
        }
    }

    compose.push_str("    healthcheck:\n");
    compose.push_str(&format!(
        "      test: [\"CMD\", \"curl\", \"-f\", \"http://localhost:{}/health\"]\n",
        port
    ));
    compose.push_str("      interval: 10s\n");
    compose.push_str("      timeout: 5s\n");
    compose.push_str("      retries: 3\n");
    compose.push('\n');

    // Postgres plus a one-shot db-init service creating each database
    if config.requires.database {
        compose.push_str("  postgres:\n");
        compose.push_str("    image: postgres:16-alpine\n");
        compose.push_str("    environment:\n");
        compose.push_str("      POSTGRES_USER: pgadmin\n");
        compose.push_str("      POSTGRES_PASSWORD: ${POSTGRES_PASSWORD:-admin123}\n");
        compose.push_str("    volumes:\n");
        compose.push_str(&format!("      - {}-pgdata:/var/lib/postgresql/data\n", app));
        compose.push_str("    healthcheck:\n");
        compose.push_str("      test: [\"CMD-SHELL\", \"pg_isready -U pgadmin\"]\n");
        compose.push_str("      interval: 5s\n");
        compose.push_str("      timeout: 3s\n");
        compose.push_str("      retries: 10\n");
        compose.push('\n');

        compose.push_str("  db-init:\n");
        compose.push_str("    image: postgres:16-alpine\n");
        compose.push_str("    depends_on:\n");
        compose.push_str("      postgres:\n");
        compose.push_str("        condition: service_healthy\n");
        compose.push_str("    environment:\n");
        compose.push_str("      PGPASSWORD: ${POSTGRES_PASSWORD:-admin123}\n");
        compose.push_str("    entrypoint: [\"/bin/sh\", \"-c\"]\n");
        compose.push_str("    command:\n");
        let mut script = String::new();
        let mut names: Vec<&str> = config.databases.iter().map(|d| d.name.as_str()).collect();
        if names.is_empty() {
            names.push(app.as_str());
        }
        for db in names {
            script.push_str(&format!(
                "psql -h postgres -U pgadmin -tc \"SELECT 1 FROM pg_database WHERE datname = ''{db}''\" | grep -q 1 || psql -h postgres -U pgadmin -c \"CREATE DATABASE {db}\"; ",
                db = db
            ));
        }
        compose.push_str(&format!("      - '{}'\n", script.trim_end()));
        compose.push('\n');
    }

    if config.requires.redis {
        compose.push_str("  redis:\n");
        compose.push_str("    image: redis:7-alpine\n");
        compose.push_str("    healthcheck:\n");
        compose.push_str("      test: [\"CMD\", \"redis-cli\", \"ping\"]\n");
        compose.push_str("      interval: 5s\n");
        compose.push_str("      timeout: 3s\n");
        compose.push_str("      retries: 10\n");
        compose.push('\n');
    }

    if config.requires.database {
        compose.push_str("volumes:\n");
        compose.push_str(&format!("  {}-pgdata:\n", app));
    }

    Ok(compose)
}
