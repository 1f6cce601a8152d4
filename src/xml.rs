//! Structural tag scanning for XML manifests.
//!
//! This is not a parser: it tokenizes start, end, and empty-element tags
//! (skipping comments, processing instructions, declarations, and CDATA)
//! and tracks nesting depth so callers can address an element by its full
//! path from the document root. Everything between tags is left untouched,
//! so edits built on these offsets keep the rest of the file byte-identical.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Open,
    Close,
    Empty,
}

#[derive(Debug, Clone)]
struct Tag<'a> {
    name: &'a str,
    kind: TagKind,
    span: Range<usize>,
}

/// Location of an element in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Span of the start tag (or the whole empty-element tag).
    pub open: Range<usize>,
    /// Span of the end tag; equal to `open` for empty elements.
    pub close: Range<usize>,
}

impl Element {
    /// Byte range between the start and end tags.
    pub fn inner(&self) -> Range<usize> {
        self.open.end..self.close.start.max(self.open.end)
    }

    /// Byte range of the whole element.
    pub fn outer(&self) -> Range<usize> {
        self.open.start..self.close.end
    }

    pub fn is_empty_tag(&self) -> bool {
        self.open == self.close
    }
}

fn tokenize(content: &str) -> Vec<Tag<'_>> {
    let bytes = content.as_bytes();
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(offset) = content[pos..].find('<') {
        let start = pos + offset;
        let rest = &content[start..];

        let skip_to = |terminator: &str| {
            rest.find(terminator)
                .map(|i| start + i + terminator.len())
                .unwrap_or(content.len())
        };

        if rest.starts_with("<!--") {
            pos = skip_to("-->");
            continue;
        }
        if rest.starts_with("<![CDATA[") {
            pos = skip_to("]]>");
            continue;
        }
        if rest.starts_with("<?") {
            pos = skip_to("?>");
            continue;
        }
        if rest.starts_with("<!") {
            pos = skip_to(">");
            continue;
        }

        let Some(end_offset) = rest.find('>') else {
            break;
        };
        let end = start + end_offset + 1;

        let (kind, name_start) = if bytes.get(start + 1) == Some(&b'/') {
            (TagKind::Close, start + 2)
        } else if end >= 2 && bytes[end - 2] == b'/' {
            (TagKind::Empty, start + 1)
        } else {
            (TagKind::Open, start + 1)
        };

        let name_end = content[name_start..end]
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .map(|i| name_start + i)
            .unwrap_or(end);
        let name = &content[name_start..name_end];
        if !name.is_empty() {
            tags.push(Tag {
                name,
                kind,
                span: start..end,
            });
        }
        pos = end;
    }

    tags
}

/// All elements whose path from the root of `content` equals `path`.
///
/// `path` includes the root element name, so `["project", "dependencies"]`
/// matches the top-level `<dependencies>` of a POM and nothing nested inside
/// `<dependencyManagement>`, `<build>`, or `<profiles>`.
pub fn elements(content: &str, path: &[&str]) -> Vec<Element> {
    let mut found = Vec::new();
    let mut stack: Vec<(&str, Range<usize>)> = Vec::new();

    let matches_path = |stack: &[(&str, Range<usize>)], name: &str| {
        stack.len() + 1 == path.len()
            && stack.iter().zip(path.iter()).all(|((n, _), p)| n == p)
            && path.last() == Some(&name)
    };

    for tag in tokenize(content) {
        match tag.kind {
            TagKind::Open => stack.push((tag.name, tag.span)),
            TagKind::Empty => {
                if matches_path(&stack, tag.name) {
                    found.push(Element {
                        open: tag.span.clone(),
                        close: tag.span,
                    });
                }
            }
            TagKind::Close => {
                let Some(idx) = stack.iter().rposition(|(n, _)| *n == tag.name) else {
                    continue;
                };
                stack.truncate(idx + 1);
                if let Some((name, open)) = stack.pop() {
                    if matches_path(&stack, name) {
                        found.push(Element {
                            open,
                            close: tag.span,
                        });
                    }
                }
            }
        }
    }

    found.sort_by_key(|e| e.open.start);
    found
}

/// The first element at `path`, if any.
pub fn find(content: &str, path: &[&str]) -> Option<Element> {
    elements(content, path).into_iter().next()
}

/// Trimmed text of the first root-level `<name>` child in `content`.
pub fn child_text<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    let element = find(content, &[name])?;
    Some(content[element.inner()].trim())
}

/// Whitespace preceding `offset` on its line.
pub fn indent_at(content: &str, offset: usize) -> &str {
    let line_start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &content[line_start..offset];
    let trimmed = prefix.trim_start();
    &prefix[..prefix.len() - trimmed.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0"?>
<project>
  <!-- <dependencies> in a comment -->
  <dependencyManagement>
    <dependencies>
      <dependency><groupId>bom</groupId></dependency>
    </dependencies>
  </dependencyManagement>
  <dependencies>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <exclusions>
        <exclusion><groupId>hamcrest</groupId></exclusion>
      </exclusions>
    </dependency>
  </dependencies>
  <build>
    <plugins>
      <plugin>
        <dependencies><dependency/></dependencies>
      </plugin>
    </plugins>
  </build>
</project>
"#;

    #[test]
    fn finds_top_level_dependencies_only() {
        let deps = elements(POM, &["project", "dependencies"]);
        assert_eq!(deps.len(), 1);
        assert!(POM[deps[0].inner()].contains("junit"));
        assert!(!POM[deps[0].inner()].contains("bom"));
    }

    #[test]
    fn nested_paths_are_addressable() {
        let managed = find(POM, &["project", "dependencyManagement", "dependencies"]).unwrap();
        assert!(POM[managed.inner()].contains("bom"));

        let plugin_deps = elements(
            POM,
            &["project", "build", "plugins", "plugin", "dependencies", "dependency"],
        );
        assert_eq!(plugin_deps.len(), 1);
        assert!(plugin_deps[0].is_empty_tag());
    }

    #[test]
    fn child_text_ignores_nested_children() {
        let dep = find(POM, &["project", "dependencies", "dependency"]).unwrap();
        let inner = &POM[dep.inner()];
        assert_eq!(child_text(inner, "groupId"), Some("junit"));
        assert_eq!(child_text(inner, "artifactId"), Some("junit"));
        assert_eq!(child_text(inner, "version"), None);
    }

    #[test]
    fn outer_covers_both_tags() {
        let content = "<a><b>x</b></a>";
        let b = find(content, &["a", "b"]).unwrap();
        assert_eq!(&content[b.outer()], "<b>x</b>");
    }

    #[test]
    fn indent_at_returns_leading_whitespace() {
        let content = "<project>\n    <build>";
        let offset = content.find("<build>").unwrap();
        assert_eq!(indent_at(content, offset), "    ");
        assert_eq!(indent_at(content, 0), "");
    }

    #[test]
    fn attributes_do_not_confuse_names() {
        let content = r#"<project xmlns="http://maven.apache.org/POM/4.0.0"><dependencies/></project>"#;
        assert_eq!(elements(content, &["project", "dependencies"]).len(), 1);
    }
}
