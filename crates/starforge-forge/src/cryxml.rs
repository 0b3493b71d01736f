//! CryXmlB binary XML decoder.
//!
//! Sidecar vehicle definitions ship as binary XML: a header, a node table,
//! an attribute-pair table, a child-index table and a string pool. Plain
//! UTF-8 XML is passed through as `Ok(None)` so callers can fall back to a
//! different reader; malformed binary input is a hard error.

use binrw::BinRead;
use binrw::io::Cursor;

use crate::error::{ForgeError, ForgeResult};

/// Binary XML magic.
pub const CRYXML_MAGIC: &[u8; 8] = b"CryXmlB\0";

#[derive(Debug, Clone, BinRead)]
#[br(little)]
struct CryXmlHeader {
    #[allow(dead_code)]
    file_length: u32,
    node_table_offset: u32,
    node_count: u32,
    attribute_table_offset: u32,
    attribute_count: u32,
    child_table_offset: u32,
    child_count: u32,
    string_data_offset: u32,
    string_data_size: u32,
}

#[derive(Debug, Clone, BinRead)]
#[br(little)]
struct RawNode {
    tag_offset: u32,
    content_offset: u32,
    attribute_count: u16,
    child_count: u16,
    parent_index: u32,
    first_attribute_index: u32,
    first_child_index: u32,
    #[allow(dead_code)]
    reserved: u32,
}

/// One decoded XML element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    /// Element tag
    pub tag: String,
    /// Attributes in declaration order
    pub attributes: Vec<(String, String)>,
    /// Child elements in declaration order
    pub children: Vec<XmlNode>,
    /// Text content, when non-empty
    pub content: Option<String>,
}

impl XmlNode {
    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All children with the given tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

/// Decode a CryXmlB buffer into a tree.
///
/// Returns `Ok(None)` when the buffer is not binary XML (plain XML or
/// anything else without the magic), letting callers fall through.
pub fn parse_cryxml(data: &[u8]) -> ForgeResult<Option<XmlNode>> {
    if data.len() < CRYXML_MAGIC.len() || &data[..CRYXML_MAGIC.len()] != CRYXML_MAGIC {
        return Ok(None);
    }

    let mut cursor = Cursor::new(&data[CRYXML_MAGIC.len()..]);
    let header = CryXmlHeader::read_le(&mut cursor)?;

    let nodes = read_table::<RawNode>(data, header.node_table_offset, header.node_count, 28)?;
    if nodes.is_empty() {
        return Err(ForgeError::MalformedXml("empty node table".into()));
    }

    let attributes = read_attribute_table(data, &header)?;
    let child_indices = read_child_table(data, &header)?;

    let strings_start = header.string_data_offset as usize;
    let strings_end = strings_start + header.string_data_size as usize;
    let strings = data
        .get(strings_start..strings_end)
        .ok_or_else(|| ForgeError::MalformedXml("string pool out of bounds".into()))?;

    let mut visited = vec![false; nodes.len()];
    build_node(0, &nodes, &attributes, &child_indices, strings, &mut visited)
        .map(Some)
}

fn build_node(
    index: usize,
    nodes: &[RawNode],
    attributes: &[(u32, u32)],
    child_indices: &[u32],
    strings: &[u8],
    visited: &mut [bool],
) -> ForgeResult<XmlNode> {
    let node = nodes
        .get(index)
        .ok_or_else(|| ForgeError::MalformedXml(format!("node index {index} out of range")))?;
    if std::mem::replace(&mut visited[index], true) {
        return Err(ForgeError::MalformedXml(format!(
            "node {index} appears twice in the child table"
        )));
    }

    let tag = pool_string(strings, node.tag_offset)?;
    let content = match pool_string(strings, node.content_offset)? {
        ref s if s.is_empty() => None,
        s => Some(s),
    };

    let attr_start = node.first_attribute_index as usize;
    let attr_end = attr_start + node.attribute_count as usize;
    let mut pairs = Vec::with_capacity(node.attribute_count as usize);
    for &(key, value) in attributes.get(attr_start..attr_end).ok_or_else(|| {
        ForgeError::MalformedXml(format!("attribute window out of range on node {index}"))
    })? {
        pairs.push((pool_string(strings, key)?, pool_string(strings, value)?));
    }

    let child_start = node.first_child_index as usize;
    let child_end = child_start + node.child_count as usize;
    let mut children = Vec::with_capacity(node.child_count as usize);
    for &child in child_indices.get(child_start..child_end).ok_or_else(|| {
        ForgeError::MalformedXml(format!("child window out of range on node {index}"))
    })? {
        children.push(build_node(
            child as usize,
            nodes,
            attributes,
            child_indices,
            strings,
            visited,
        )?);
    }

    Ok(XmlNode {
        tag,
        attributes: pairs,
        children,
        content,
    })
}

fn read_table<T: for<'a> BinRead<Args<'a> = ()>>(
    data: &[u8],
    offset: u32,
    count: u32,
    width: usize,
) -> ForgeResult<Vec<T>> {
    let start = offset as usize;
    let end = start + count as usize * width;
    let raw = data
        .get(start..end)
        .ok_or_else(|| ForgeError::MalformedXml("table out of bounds".into()))?;
    let mut cursor = Cursor::new(raw);
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(T::read_le(&mut cursor)?);
    }
    Ok(out)
}

fn read_attribute_table(data: &[u8], header: &CryXmlHeader) -> ForgeResult<Vec<(u32, u32)>> {
    let start = header.attribute_table_offset as usize;
    let end = start + header.attribute_count as usize * 8;
    let raw = data
        .get(start..end)
        .ok_or_else(|| ForgeError::MalformedXml("attribute table out of bounds".into()))?;
    Ok(raw
        .chunks_exact(8)
        .map(|c| {
            (
                u32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                u32::from_le_bytes([c[4], c[5], c[6], c[7]]),
            )
        })
        .collect())
}

fn read_child_table(data: &[u8], header: &CryXmlHeader) -> ForgeResult<Vec<u32>> {
    let start = header.child_table_offset as usize;
    let end = start + header.child_count as usize * 4;
    let raw = data
        .get(start..end)
        .ok_or_else(|| ForgeError::MalformedXml("child table out of bounds".into()))?;
    Ok(raw
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn pool_string(strings: &[u8], offset: u32) -> ForgeResult<String> {
    let start = offset as usize;
    if start >= strings.len() {
        // Offset 0 in an empty pool and saturated "no content" offsets both
        // mean the empty string.
        if start == 0 || offset == u32::MAX {
            return Ok(String::new());
        }
        return Err(ForgeError::MalformedXml(format!(
            "string offset {offset} out of range"
        )));
    }
    let end = strings[start..]
        .iter()
        .position(|&b| b == 0)
        .map_or(strings.len(), |p| start + p);
    Ok(String::from_utf8_lossy(&strings[start..end]).into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct Writer {
        nodes: Vec<RawNodeSpec>,
        attributes: Vec<(u32, u32)>,
        children: Vec<u32>,
        strings: Vec<u8>,
    }

    struct RawNodeSpec {
        tag: u32,
        content: u32,
        attrs: (u32, u16),
        kids: (u32, u16),
        parent: u32,
    }

    impl Writer {
        fn new() -> Self {
            Self {
                nodes: Vec::new(),
                attributes: Vec::new(),
                children: Vec::new(),
                strings: vec![0], // offset 0 is the empty string
            }
        }

        fn intern(&mut self, s: &str) -> u32 {
            if s.is_empty() {
                return 0;
            }
            let at = self.strings.len() as u32;
            self.strings.extend_from_slice(s.as_bytes());
            self.strings.push(0);
            at
        }

        fn node(&mut self, tag: &str, content: &str, parent: u32, attrs: &[(&str, &str)]) -> u32 {
            let tag = self.intern(tag);
            let content = self.intern(content);
            let first_attr = self.attributes.len() as u32;
            for (k, v) in attrs {
                let k = self.intern(k);
                let v = self.intern(v);
                self.attributes.push((k, v));
            }
            let index = self.nodes.len() as u32;
            self.nodes.push(RawNodeSpec {
                tag,
                content,
                attrs: (first_attr, attrs.len() as u16),
                kids: (0, 0),
                parent,
            });
            index
        }

        fn set_children(&mut self, node: u32, children: &[u32]) {
            let first = self.children.len() as u32;
            self.children.extend_from_slice(children);
            let spec = &mut self.nodes[node as usize];
            spec.kids = (first, children.len() as u16);
        }

        fn build(&self) -> Vec<u8> {
            let header_len = CRYXML_MAGIC.len() + 36;
            let node_table_offset = header_len as u32;
            let attribute_table_offset = node_table_offset + self.nodes.len() as u32 * 28;
            let child_table_offset = attribute_table_offset + self.attributes.len() as u32 * 8;
            let string_data_offset = child_table_offset + self.children.len() as u32 * 4;

            let mut out = Vec::new();
            out.extend_from_slice(CRYXML_MAGIC);
            out.extend_from_slice(
                &(string_data_offset + self.strings.len() as u32).to_le_bytes(),
            );
            out.extend_from_slice(&node_table_offset.to_le_bytes());
            out.extend_from_slice(&(self.nodes.len() as u32).to_le_bytes());
            out.extend_from_slice(&attribute_table_offset.to_le_bytes());
            out.extend_from_slice(&(self.attributes.len() as u32).to_le_bytes());
            out.extend_from_slice(&child_table_offset.to_le_bytes());
            out.extend_from_slice(&(self.children.len() as u32).to_le_bytes());
            out.extend_from_slice(&string_data_offset.to_le_bytes());
            out.extend_from_slice(&(self.strings.len() as u32).to_le_bytes());

            for node in &self.nodes {
                out.extend_from_slice(&node.tag.to_le_bytes());
                out.extend_from_slice(&node.content.to_le_bytes());
                out.extend_from_slice(&node.attrs.1.to_le_bytes());
                out.extend_from_slice(&node.kids.1.to_le_bytes());
                out.extend_from_slice(&node.parent.to_le_bytes());
                out.extend_from_slice(&node.attrs.0.to_le_bytes());
                out.extend_from_slice(&node.kids.0.to_le_bytes());
                out.extend_from_slice(&0u32.to_le_bytes());
            }
            for &(k, v) in &self.attributes {
                out.extend_from_slice(&k.to_le_bytes());
                out.extend_from_slice(&v.to_le_bytes());
            }
            for &c in &self.children {
                out.extend_from_slice(&c.to_le_bytes());
            }
            out.extend_from_slice(&self.strings);
            out
        }
    }

    #[test]
    fn decodes_a_vehicle_style_tree() {
        let mut w = Writer::new();
        let root = w.node("Vehicle", "", u32::MAX, &[("name", "TestHull")]);
        let parts = w.node("Parts", "", root, &[]);
        let body = w.node(
            "Part",
            "",
            parts,
            &[("name", "Body"), ("class", "Animated"), ("damageMax", "1200")],
        );
        let port = w.node(
            "Part",
            "",
            body,
            &[("name", "hardpoint_gun"), ("class", "ItemPort")],
        );
        w.set_children(root, &[parts]);
        w.set_children(parts, &[body]);
        w.set_children(body, &[port]);

        let tree = parse_cryxml(&w.build()).unwrap().expect("binary xml");
        assert_eq!(tree.tag, "Vehicle");
        assert_eq!(tree.attr("name"), Some("TestHull"));

        let body = tree.child("Parts").unwrap().child("Part").unwrap();
        assert_eq!(body.attr("damageMax"), Some("1200"));
        assert_eq!(body.children.len(), 1);
        assert_eq!(body.children[0].attr("class"), Some("ItemPort"));
    }

    #[test]
    fn content_text_is_captured() {
        let mut w = Writer::new();
        let root = w.node("Label", "hello there", u32::MAX, &[]);
        let _ = root;
        let tree = parse_cryxml(&w.build()).unwrap().unwrap();
        assert_eq!(tree.content.as_deref(), Some("hello there"));
    }

    #[test]
    fn plain_xml_falls_through() {
        assert_eq!(parse_cryxml(b"<Vehicle name=\"x\"/>").unwrap(), None);
        assert_eq!(parse_cryxml(b"").unwrap(), None);
        assert_eq!(parse_cryxml(b"not xml at all").unwrap(), None);
    }

    #[test]
    fn malformed_binary_is_a_hard_error() {
        let mut raw = CRYXML_MAGIC.to_vec();
        raw.extend_from_slice(&[0xFF; 8]); // header cut short
        assert!(parse_cryxml(&raw).is_err());

        // Valid header but a child table that loops back to the root.
        let mut w = Writer::new();
        let root = w.node("A", "", u32::MAX, &[]);
        w.set_children(root, &[0]);
        assert!(parse_cryxml(&w.build()).is_err());
    }
}
