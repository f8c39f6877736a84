//! Markdown fragments spliced between documentation markers.
//!
//! Every renderer is a pure function of the entity list and a version label.
//! None of them emit the marker lines themselves.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::classifier::ModuleType;
use crate::config::TargetContent;
use crate::entity::InstrumentationEntity;

const SUPPORTED_LIBRARIES_HEADER: &str = concat!(
	"| Library/Framework | Auto-instrumented versions | Standalone Library Instrumentation [1] | Functionality / Semantic Conventions |\n",
	"| ----------------- | -------------------------- | -------------------------------------- | ------------------------------------ |\n",
);
const APP_SERVERS_HEADER: &str =
	"| Application Server | Versions |\n|--------------------|----------|\n";
const DISABLE_LIST_HEADER: &str =
	"| Library/Framework | Instrumentation name |\n| ----------------- | -------------------- |\n";
const NO_APP_SERVERS: &str = "No application servers documented.\n";
const STANDALONE_FOOTNOTE: &str = "[1]: Standalone library instrumentations are published as separate \
                                   artifacts and can be used without the Java agent.\n";

/// Published location of every standalone library artifact.
const MAVEN_CENTRAL_BASE: &str = "https://central.sonatype.com/artifact/io.opentelemetry.instrumentation/";

/// Where the documentation site serves the semantic conventions.
const SEMCONV_SITE_BASE: &str = "/docs/specs/semconv/";

/// Semantic convention identifiers and their page in the semantic
/// conventions repository's `docs/` tree.
const SEMCONV_DOCS: [(&str, &str); 19] = [
	("DATABASE_CLIENT_METRICS", "database/database-metrics.md"),
	("DATABASE_CLIENT_SPANS", "database/database-spans.md"),
	("DATABASE_POOL_METRICS", "database/database-metrics.md#connection-pools"),
	("DB_CLIENT_METRICS", "database/database-metrics.md"),
	("DB_CLIENT_SPANS", "database/database-spans.md"),
	("FAAS_SERVER_SPANS", "faas/faas-spans.md"),
	("GENAI_CLIENT_METRICS", "gen-ai/gen-ai-metrics.md"),
	("GENAI_CLIENT_SPANS", "gen-ai/gen-ai-spans.md"),
	("GRAPHQL_SERVER_SPANS", "graphql/graphql-spans.md"),
	("HTTP_CLIENT_METRICS", "http/http-metrics.md#http-client"),
	("HTTP_CLIENT_SPANS", "http/http-spans.md#http-client"),
	("HTTP_SERVER_METRICS", "http/http-metrics.md#http-server"),
	("HTTP_SERVER_SPANS", "http/http-spans.md#http-server"),
	("JVM_RUNTIME_METRICS", "runtime/jvm-metrics.md"),
	("MESSAGING_SPANS", "messaging/messaging-spans.md"),
	("RPC_CLIENT_METRICS", "rpc/rpc-metrics.md#rpc-client"),
	("RPC_CLIENT_SPANS", "rpc/rpc-spans.md"),
	("RPC_SERVER_METRICS", "rpc/rpc-metrics.md#rpc-server"),
	("RPC_SERVER_SPANS", "rpc/rpc-spans.md"),
];

/// Substrings identifying application server modules.
const APP_SERVER_KEYWORDS: [&str; 6] = [
	"tomcat",
	"jetty",
	"websphere",
	"wildfly",
	"undertow",
	"glassfish",
];

/// Convention words kept upper case by [`format_semantic_convention`].
const CONVENTION_ACRONYMS: [&str; 8] = ["HTTP", "RPC", "JVM", "GRPC", "DNS", "DB", "SQL", "URL"];

/// Name words kept upper case by the [`display_name`] fallback.
const NAME_ACRONYMS: [&str; 26] = [
	"http", "https", "grpc", "rpc", "jms", "jdbc", "jmx", "aws", "sql", "xml", "json", "api",
	"sdk", "jvm", "jsp", "rmi", "url", "uri", "tcp", "udp", "dns", "ssl", "tls", "oauth", "jwt",
	"uuid",
];

/// Names left out of the disable list.
const DISABLE_LIST_EXCLUSIONS: [&str; 2] = ["resources", "spring-boot-resources"];

/// Names folded into another entry of the disable list.
const DISABLE_LIST_OVERRIDES: [(&str, &str); 1] = [("akka-actor-fork-join", "akka-actor")];

static VERSION_SUFFIX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"-[0-9].*$").expect("invalid version suffix pattern"));

const DISPLAY_NAMES: &[(&str, &str)] = &[
	("akka-actor", "Akka Actor"),
	("akka-http", "Akka HTTP"),
	("apache-dbcp", "Apache DBCP"),
	("apache-dubbo", "Apache Dubbo"),
	("apache-httpasyncclient", "Apache HttpAsyncClient"),
	("apache-httpclient", "Apache HttpClient"),
	("apache-shenyu", "Apache ShenYu"),
	("async-http-client", "AsyncHttpClient (AHC)"),
	("avaje-jex", "Avaje Jex"),
	("aws-lambda", "AWS Lambda"),
	("aws-sdk", "AWS SDK"),
	("azure-core", "Azure SDK"),
	("c3p0", "C3P0"),
	("dropwizard-metrics", "Dropwizard Metrics"),
	("dropwizard-views", "Dropwizard Views"),
	("elasticsearch-api-client", "Elasticsearch API client"),
	("elasticsearch-rest", "Elasticsearch REST client"),
	("elasticsearch-transport", "Elasticsearch client"),
	("executors", "java.util.concurrent"),
	("external-annotations", "Additional tracing annotations"),
	("google-http-client", "Google HTTP client"),
	("grpc", "GRPC"),
	("gwt", "Google Web Toolkit"),
	("hikaricp", "HikariCP"),
	("http-url-connection", "Java `HttpURLConnection`"),
	("java-http-client", "Java HTTP Client"),
	("java-http-server", "Java HTTP Server"),
	("java-util-logging", "java.util.logging"),
	("jaxrs", "JAX-RS (Server)"),
	("jaxrs-client", "JAX-RS (Client)"),
	("jaxws", "JAX-WS"),
	("jboss-logmanager-appender", "JBoss Logging Appender"),
	("jboss-logmanager-mdc", "JBoss Logging MDC"),
	("jdbc", "Java JDBC"),
	("jdbc-datasource", "Java JDBC `DataSource`"),
	("jetty-httpclient", "Eclipse Jetty HTTP Client"),
	("jms", "JMS"),
	("jsf-mojarra", "Eclipse Mojarra"),
	("jsf-myfaces", "Apache MyFaces"),
	("jsp", "JSP"),
	("kotlinx-coroutines", "kotlinx.coroutines"),
	("ktor", "Ktor"),
	("kubernetes-client", "K8s Client"),
	("log4j-appender", "Log4j Appender"),
	("log4j-context-data", "Log4j Context Data (2.x)"),
	("log4j-mdc", "Log4j MDC (1.x)"),
	("logback-appender", "Logback Appender"),
	("logback-mdc", "Logback MDC"),
	("methods", "Additional methods tracing"),
	("mongo", "MongoDB"),
	("mybatis", "MyBatis"),
	("nats", "NATS Client"),
	("okhttp", "OkHttp"),
	("openai", "OpenAI"),
	("opensearch-java", "OpenSearch Java"),
	("opensearch-rest", "OpenSearch REST"),
	("opentelemetry-api", "OpenTelemetry API"),
	("opentelemetry-extension-annotations", "OpenTelemetry Extension Annotations"),
	("opentelemetry-instrumentation-annotations", "OpenTelemetry Instrumentation Annotations"),
	("oracle-ucp", "Oracle UCP"),
	("oshi", "OSHI (Operating System and Hardware Information)"),
	("pekko-actor", "Apache Pekko Actor"),
	("pekko-http", "Apache Pekko HTTP"),
	("play-ws", "Play WS HTTP Client"),
	("r2dbc", "R2DBC"),
	("rabbitmq", "RabbitMQ Client"),
	("reactor-kafka", "Reactor Kafka"),
	("reactor-netty", "Reactor Netty"),
	("rediscala", "Rediscala"),
	("rmi", "Java RMI"),
	("rocketmq-client", "Apache RocketMQ"),
	("runtime-telemetry", "Java Runtime"),
	("rxjava", "ReactiveX RxJava"),
	("scala-fork-join", "Scala ForkJoinPool"),
	("servlet", "Java Servlet"),
	("spring-boot-actuator-autoconfigure", "Spring Boot Actuator Autoconfigure"),
	("spring-cloud-aws", "Spring Cloud AWS"),
	("spring-cloud-gateway", "Spring Cloud Gateway"),
	("spring-core", "Spring Core"),
	("spring-data", "Spring Data"),
	("spring-integration", "Spring Integration"),
	("spring-jms", "Spring JMS"),
	("spring-kafka", "Spring Kafka"),
	("spring-pulsar", "Spring Pulsar"),
	("spring-rabbit", "Spring RabbitMQ"),
	("spring-rmi", "Spring RMI"),
	("spring-scheduling", "Spring Scheduling"),
	("spring-security-config", "Spring Security Config"),
	("spring-web", "Spring Web"),
	("spring-webflux", "Spring WebFlux"),
	("spring-webmvc", "Spring Web MVC"),
	("spring-ws", "Spring Web Services"),
	("tomcat-jdbc", "Tomcat JDBC"),
	("twilio", "Twilio SDK"),
	("vertx-http-client", "Eclipse Vert.x HttpClient"),
	("vertx-kafka-client", "Eclipse Vert.x Kafka Client"),
	("vertx-redis-client", "Eclipse Vert.x Redis Client"),
	("vertx-rx-java", "Eclipse Vert.x RxJava"),
	("vertx-sql-client", "Eclipse Vert.x SQL Client"),
	("vertx-web", "Eclipse Vert.x Web"),
	("vibur-dbcp", "Vibur DBCP"),
	("xxl-job", "XXL-JOB"),
	("zio", "ZIO"),
];

/// Render the fragment a doc target asks for.
pub fn render_target(
	content: TargetContent,
	entities: &[InstrumentationEntity],
	version: &str,
) -> String {
	match content {
		TargetContent::SupportedLibraries => render_supported_libraries(entities, version),
		TargetContent::AppServers => render_app_servers(entities, version),
		TargetContent::DisableList => render_disable_list(entities, version),
	}
}

/// The supported libraries table, one row per entity, grouped by
/// [`library_family`].
///
/// The table is followed by the `[1]` footnote of its header and a link
/// definition for every semantic convention it references.
pub fn render_supported_libraries(entities: &[InstrumentationEntity], version: &str) -> String {
	let mut families: BTreeMap<&str, Vec<&InstrumentationEntity>> = BTreeMap::new();
	for entity in entities {
		families.entry(library_family(&entity.name)).or_default().push(entity);
	}

	let mut rows = Vec::new();
	let mut referenced = BTreeSet::new();
	for members in families.values_mut() {
		members.sort_by(|a, b| a.name.cmp(&b.name));
		for entity in members.iter() {
			let conventions = entity_conventions(entity);
			rows.push(format!(
				"| {} | {} | {} | {} |\n",
				library_cell(entity),
				agent_versions(entity),
				standalone_library_cell(entity),
				semantic_conventions_cell(&conventions),
			));
			referenced.extend(conventions);
		}
	}

	let mut output = String::from(SUPPORTED_LIBRARIES_HEADER);
	output.push_str(&rows.concat());
	output.push('\n');
	output.push_str(STANDALONE_FOOTNOTE);

	let definitions = semantic_convention_link_definitions(&referenced);
	if !definitions.is_empty() {
		output.push('\n');
		for definition in definitions {
			output.push_str(&definition);
			output.push('\n');
		}
	}

	push_footer(&mut output, version);
	output
}

/// Application servers and the agent versions they are verified against.
pub fn render_app_servers(entities: &[InstrumentationEntity], version: &str) -> String {
	let mut servers: Vec<&InstrumentationEntity> =
		entities.iter().filter(|e| is_app_server(&e.name)).collect();

	if servers.is_empty() {
		return NO_APP_SERVERS.to_string();
	}

	servers.sort_by(|a, b| a.name.cmp(&b.name));

	let mut output = String::from(APP_SERVERS_HEADER);
	for entity in servers {
		output.push_str(&format!(
			"| {} | {} |\n",
			entity.display_name(),
			agent_versions(entity)
		));
	}

	push_footer(&mut output, version);
	output
}

/// The names users pass to disable an instrumentation.
pub fn render_disable_list(entities: &[InstrumentationEntity], version: &str) -> String {
	render_disable_list_for_names(entities.iter().map(|e| e.name.as_str()), version)
}

/// Like [`render_disable_list`], from bare module names.
pub fn render_disable_list_for_names<'a>(
	names: impl IntoIterator<Item = &'a str>,
	version: &str,
) -> String {
	let names: BTreeSet<String> = names
		.into_iter()
		.map(|name| VERSION_SUFFIX.replace(name, "").into_owned())
		.filter(|name| !DISABLE_LIST_EXCLUSIONS.contains(&name.as_str()))
		.map(|name| {
			DISABLE_LIST_OVERRIDES
				.iter()
				.find(|(from, _)| *from == name)
				.map_or(name, |(_, to)| (*to).to_string())
		})
		.collect();

	let mut output = String::from(DISABLE_LIST_HEADER);
	for name in &names {
		output.push_str(&format!("| {} | `{name}` |\n", display_name(name)));
	}

	push_footer(&mut output, version);
	output
}

/// Shorten a version range for display.
///
/// Coordinates (`group:artifact:range`) are reduced to their range first.
/// `[2.0,)` becomes `2.0+`, `[2.0,3.0)` becomes `2.0 - 3.0`, and anything
/// else is returned unchanged.
pub fn format_version_range(spec: &str) -> String {
	let parts: Vec<&str> = spec.split(':').collect();
	let range = if parts.len() >= 3 { parts[parts.len() - 1] } else { spec };

	let Some(inner) = range.strip_prefix('[').and_then(|r| r.strip_suffix(')')) else {
		return range.to_string();
	};

	match inner.split_once(',') {
		Some((lower, upper)) if !lower.trim().is_empty() && !upper.contains(',') => {
			if upper.trim().is_empty() {
				format!("{}+", lower.trim())
			} else {
				format!("{} - {}", lower.trim(), upper.trim())
			}
		}
		_ => range.to_string(),
	}
}

/// Human display name for a module name, e.g. `akka-http` is `Akka HTTP`.
pub fn display_name(name: &str) -> String {
	if let Some((_, display)) = DISPLAY_NAMES.iter().find(|(key, _)| *key == name) {
		return (*display).to_string();
	}

	name.split('-')
		.map(|part| {
			let part = part.to_lowercase();
			if NAME_ACRONYMS.contains(&part.as_str()) {
				part.to_uppercase()
			} else {
				capitalize(&part)
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

/// `HTTP_SERVER_SPANS` becomes `[HTTP Server Spans]`.
pub fn format_semantic_convention(convention: &str) -> String {
	let words: Vec<String> = convention
		.split('_')
		.filter(|part| !part.is_empty())
		.map(|part| {
			if CONVENTION_ACRONYMS.contains(&part) {
				part.to_string()
			} else {
				capitalize(&part.to_lowercase())
			}
		})
		.collect();

	format!("[{}]", words.join(" "))
}

/// Link definitions for the conventions in `conventions` that have a page
/// on the documentation site, ordered by identifier.
///
/// `HTTP_CLIENT_SPANS` yields
/// `[HTTP Client Spans]: /docs/specs/semconv/http/http-spans/#http-client`.
pub fn semantic_convention_link_definitions(conventions: &BTreeSet<String>) -> Vec<String> {
	conventions
		.iter()
		.filter_map(|convention| {
			let (_, page) = SEMCONV_DOCS.iter().find(|(id, _)| *id == convention.as_str())?;
			Some(format!(
				"{}: {}",
				format_semantic_convention(convention),
				semconv_site_link(page)
			))
		})
		.collect()
}

/// Site path of a page in the semantic conventions `docs/` tree. The `.md`
/// extension becomes a trailing slash.
pub fn semconv_site_link(page: &str) -> String {
	let page = page.replace(".md#", "/#").replace(".md", "/");
	format!("{SEMCONV_SITE_BASE}{page}")
}

/// The Maven Central page of a standalone library artifact.
pub fn maven_central_link(artifact: &str) -> String {
	format!("{MAVEN_CENTRAL_BASE}{artifact}")
}

/// The token before the first `-` of a module name.
pub fn library_family(name: &str) -> &str {
	match name.find('-') {
		Some(index) if index > 0 => &name[..index],
		_ => name,
	}
}

fn is_app_server(name: &str) -> bool {
	let name = name.to_lowercase();
	APP_SERVER_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

fn library_cell(entity: &InstrumentationEntity) -> String {
	let display = entity.display_name();
	match entity.metadata.as_ref().and_then(|m| m.library_link.as_deref()) {
		Some(link) => format!("[{display}]({link})"),
		None => display.to_string(),
	}
}

fn agent_versions(entity: &InstrumentationEntity) -> String {
	match entity.target_versions.get(&ModuleType::JavaAgent) {
		Some(versions) if !versions.is_empty() => {
			versions
				.iter()
				.map(|v| format_version_range(v))
				.collect::<Vec<_>>()
				.join("<br>")
		}
		_ => "N/A".to_string(),
	}
}

fn standalone_library_cell(entity: &InstrumentationEntity) -> String {
	if !entity.has_type(ModuleType::Library) {
		return "N/A".to_string();
	}

	let artifact = format!("opentelemetry-{}", entity.name);
	format!("[{artifact}]({})", maven_central_link(&artifact))
}

/// Declared conventions, or the detected capability tags when the metadata
/// declares none.
fn entity_conventions(entity: &InstrumentationEntity) -> Vec<String> {
	let declared = entity
		.metadata
		.as_ref()
		.map(|m| m.semantic_conventions.clone())
		.unwrap_or_default();
	if declared.is_empty() {
		entity.semantic_tags.iter().map(|tag| tag.to_uppercase()).collect()
	} else {
		declared
	}
}

fn semantic_conventions_cell(conventions: &[String]) -> String {
	if conventions.is_empty() {
		return "none".to_string();
	}

	conventions
		.iter()
		.map(|c| format_semantic_convention(c))
		.collect::<Vec<_>>()
		.join(", ")
}

fn push_footer(output: &mut String, version: &str) {
	output.push_str(&format!("\n_Auto-generated for version {version}_\n"));
}

fn capitalize(word: &str) -> String {
	let mut chars = word.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
