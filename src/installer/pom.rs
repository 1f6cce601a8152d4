//! Structural edits to a Maven POM.
//!
//! Sections are located with [`crate::xml`] by their full path from the
//! `<project>` root, so `<dependencies>` blocks nested in
//! `<dependencyManagement>`, plugins, or profiles are never mistaken for the
//! top-level one. New elements are indented one step below their parent.

use std::collections::HashSet;
use std::path::Path;

use super::insert_block;
use crate::error::{InstrumentorError, Result};
use crate::xml::{self, Element};

/// Version placeholder meaning "let Maven pick".
pub const LATEST: &str = "LATEST";

/// Dependencies from this group pull in the shade plugin.
pub const OTEL_GROUP: &str = "io.opentelemetry";

const INDENT: &str = "  ";
const SHADE_ARTIFACT: &str = "maven-shade-plugin";

const SHADE_PLUGIN: &str = r#"<plugin>
  <groupId>org.apache.maven.plugins</groupId>
  <artifactId>maven-shade-plugin</artifactId>
  <version>3.4.1</version>
  <executions>
    <execution>
      <phase>package</phase>
      <goals>
        <goal>shade</goal>
      </goals>
      <configuration>
        <createDependencyReducedPom>false</createDependencyReducedPom>
        <transformers>
          <transformer implementation="org.apache.maven.plugins.shade.resource.ManifestResourceTransformer">
            <mainClass>com.example.App</mainClass>
          </transformer>
        </transformers>
      </configuration>
    </execution>
  </executions>
</plugin>
"#;

const PROJECT: &[&str] = &["project"];
const DEPENDENCIES: &[&str] = &["project", "dependencies"];
const DEPENDENCY: &[&str] = &["project", "dependencies", "dependency"];
const MANAGEMENT: &[&str] = &["project", "dependencyManagement"];
const MANAGED_DEPENDENCIES: &[&str] = &["project", "dependencyManagement", "dependencies"];
const MANAGED_DEPENDENCY: &[&str] = &["project", "dependencyManagement", "dependencies", "dependency"];
const BUILD: &[&str] = &["project", "build"];
const PLUGINS: &[&str] = &["project", "build", "plugins"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Coordinate<'a> {
    group: &'a str,
    artifact: &'a str,
    version: Option<&'a str>,
}

impl<'a> Coordinate<'a> {
    fn parse(dep: &'a str) -> Result<Self> {
        let mut parts = dep.split(':');
        match (parts.next(), parts.next()) {
            (Some(group), Some(artifact)) if !group.is_empty() && !artifact.is_empty() => Ok(Self {
                group,
                artifact,
                version: parts.next().filter(|v| !v.is_empty() && *v != LATEST),
            }),
            _ => Err(InstrumentorError::InvalidDependency {
                dependency: dep.to_string(),
                message: "expected group:artifact[:version]".to_string(),
            }),
        }
    }

    /// An import-scoped BOM needs a `<version>`; fall back to [`LATEST`].
    fn pinned_or_latest(mut self) -> Self {
        self.version.get_or_insert(LATEST);
        self
    }

    fn key(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    fn render(&self, indent: &str, with_version: bool, import: bool) -> String {
        let child = format!("{indent}{INDENT}");
        let mut out = format!(
            "{indent}<dependency>\n{child}<groupId>{}</groupId>\n{child}<artifactId>{}</artifactId>\n",
            self.group, self.artifact
        );
        if let Some(version) = self.version.filter(|_| with_version) {
            out.push_str(&format!("{child}<version>{version}</version>\n"));
        }
        if import {
            out.push_str(&format!("{child}<type>pom</type>\n{child}<scope>import</scope>\n"));
        }
        out.push_str(&format!("{indent}</dependency>\n"));
        out
    }
}

/// Whether a coordinate names a bill of materials.
pub fn is_bom(dep: &str) -> bool {
    dep.contains("-bom:") || dep.contains("opentelemetry-bom")
}

/// Add `group:artifact[:version]` coordinates to a POM.
///
/// BOMs go to `<dependencyManagement>` as `pom`/`import` entries. Other
/// coordinates go to the top-level `<dependencies>`, without `<version>`
/// when a BOM manages it. Missing sections are created. The shade plugin is
/// added once when any coordinate belongs to [`OTEL_GROUP`].
pub fn add_dependencies(path: &Path, content: &str, dependencies: &[String]) -> Result<String> {
    project_element(path, content)?;

    let mut boms = Vec::new();
    let mut regular = Vec::new();
    for dep in dependencies {
        let coordinate = Coordinate::parse(dep)?;
        if is_bom(dep) {
            boms.push(coordinate.pinned_or_latest());
        } else {
            regular.push(coordinate);
        }
    }

    let mut out = content.to_string();
    if !boms.is_empty() {
        out = add_managed_boms(path, &out, &boms)?;
    }
    if !regular.is_empty() {
        let managed = !boms.is_empty() || imports_bom(&out);
        out = add_top_level(path, &out, &regular, !managed)?;
    }
    if dependencies.iter().any(|dep| dep.contains(OTEL_GROUP)) {
        out = add_shade_plugin(path, &out)?;
    }
    Ok(out)
}

fn project_element(path: &Path, content: &str) -> Result<Element> {
    xml::find(content, PROJECT)
        .filter(|project| !project.is_empty_tag())
        .ok_or_else(|| InstrumentorError::MalformedManifest {
            path: path.to_path_buf(),
            message: "missing </project> closing tag".to_string(),
        })
}

fn imports_bom(content: &str) -> bool {
    xml::find(content, MANAGEMENT)
        .is_some_and(|management| content[management.inner()].contains("<scope>import</scope>"))
}

fn declared(content: &str, path: &[&str]) -> HashSet<String> {
    xml::elements(content, path)
        .into_iter()
        .filter_map(|dep| {
            let inner = &content[dep.inner()];
            let group = xml::child_text(inner, "groupId")?;
            let artifact = xml::child_text(inner, "artifactId")?;
            Some(format!("{group}:{artifact}"))
        })
        .collect()
}

fn render_new(
    coordinates: &[Coordinate<'_>],
    mut existing: HashSet<String>,
    indent: &str,
    with_version: bool,
    import: bool,
) -> String {
    coordinates
        .iter()
        .filter(|c| existing.insert(c.key()))
        .map(|c| c.render(indent, with_version, import))
        .collect()
}

fn children_indent(content: &str, element: &Element) -> String {
    format!("{}{INDENT}", xml::indent_at(content, element.open.start))
}

fn indent_block(block: &str, indent: &str) -> String {
    block.lines().map(|line| format!("{indent}{line}\n")).collect()
}

/// Append `children` as the last content of `element`.
fn append_children(content: &str, element: &Element, name: &str, children: &str) -> String {
    if element.is_empty_tag() {
        let indent = xml::indent_at(content, element.open.start);
        return format!(
            "{}<{name}>\n{children}{indent}</{name}>{}",
            &content[..element.open.start],
            &content[element.open.end..]
        );
    }
    insert_block(content, element.close.start, children)
}

fn add_managed_boms(path: &Path, content: &str, boms: &[Coordinate<'_>]) -> Result<String> {
    let project = project_element(path, content)?;

    if let Some(dependencies) = xml::find(content, MANAGED_DEPENDENCIES) {
        let indent = children_indent(content, &dependencies);
        let entries = render_new(boms, declared(content, MANAGED_DEPENDENCY), &indent, true, true);
        if entries.is_empty() {
            return Ok(content.to_string());
        }
        return Ok(append_children(content, &dependencies, "dependencies", &entries));
    }

    if let Some(management) = xml::find(content, MANAGEMENT) {
        let indent = children_indent(content, &management);
        let entries = render_new(boms, HashSet::new(), &format!("{indent}{INDENT}"), true, true);
        let block = format!("{indent}<dependencies>\n{entries}{indent}</dependencies>\n");
        return Ok(append_children(content, &management, "dependencyManagement", &block));
    }

    let indent = children_indent(content, &project);
    let entries = render_new(
        boms,
        HashSet::new(),
        &format!("{indent}{INDENT}{INDENT}"),
        true,
        true,
    );
    let block = format!(
        "{indent}<dependencyManagement>\n{indent}{INDENT}<dependencies>\n{entries}{indent}{INDENT}</dependencies>\n{indent}</dependencyManagement>\n"
    );
    let anchor = xml::find(content, DEPENDENCIES)
        .or_else(|| xml::find(content, BUILD))
        .map(|element| element.open.start)
        .unwrap_or(project.close.start);
    Ok(insert_block(content, anchor, &block))
}

fn add_top_level(
    path: &Path,
    content: &str,
    coordinates: &[Coordinate<'_>],
    with_version: bool,
) -> Result<String> {
    let project = project_element(path, content)?;

    if let Some(dependencies) = xml::find(content, DEPENDENCIES) {
        let indent = children_indent(content, &dependencies);
        let entries = render_new(coordinates, declared(content, DEPENDENCY), &indent, with_version, false);
        if entries.is_empty() {
            return Ok(content.to_string());
        }
        return Ok(append_children(content, &dependencies, "dependencies", &entries));
    }

    let indent = children_indent(content, &project);
    let entries = render_new(
        coordinates,
        HashSet::new(),
        &format!("{indent}{INDENT}"),
        with_version,
        false,
    );
    let block = format!("{indent}<dependencies>\n{entries}{indent}</dependencies>\n");
    Ok(insert_block(content, project.close.start, &block))
}

fn add_shade_plugin(path: &Path, content: &str) -> Result<String> {
    if content.contains(SHADE_ARTIFACT) {
        return Ok(content.to_string());
    }
    let project = project_element(path, content)?;

    if let Some(plugins) = xml::find(content, PLUGINS) {
        let indent = children_indent(content, &plugins);
        return Ok(append_children(
            content,
            &plugins,
            "plugins",
            &indent_block(SHADE_PLUGIN, &indent),
        ));
    }

    if let Some(build) = xml::find(content, BUILD) {
        let indent = children_indent(content, &build);
        let block = format!(
            "{indent}<plugins>\n{}{indent}</plugins>\n",
            indent_block(SHADE_PLUGIN, &format!("{indent}{INDENT}"))
        );
        return Ok(append_children(content, &build, "build", &block));
    }

    let indent = children_indent(content, &project);
    let block = format!(
        "{indent}<build>\n{indent}{INDENT}<plugins>\n{}{indent}{INDENT}</plugins>\n{indent}</build>\n",
        indent_block(SHADE_PLUGIN, &format!("{indent}{INDENT}{INDENT}"))
    );
    Ok(insert_block(content, project.close.start, &block))
}
