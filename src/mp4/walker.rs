// Index-based box tree walker
//
// A walker is just (data, position, end). It never holds references into
// the tree it has already passed, so it can be recreated at any recorded
// offset; the decode pass uses that to jump straight back to `mdat`.

use std::ops::Range;

use tracing::{debug, warn};

use super::atoms;
use super::header::BoxHeader;
use crate::error::{Error, Result};

/// One visited box: where it starts and what its header says
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxRecord {
    pub offset: usize,
    pub header: BoxHeader,
}

impl BoxRecord {
    pub fn payload_range(&self) -> Range<usize> {
        self.offset + self.header.header_length..self.end()
    }

    pub fn end(&self) -> usize {
        self.offset + self.header.size()
    }

    pub fn is(&self, box_type: &[u8; 4]) -> bool {
        &self.header.box_type == box_type
    }
}

/// Iterates sibling boxes in a byte range
///
/// Yields `Err(MalformedBox)` at most once, then stops.
#[derive(Debug, Clone)]
pub struct BoxWalker<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    done: bool,
}

impl<'a> BoxWalker<'a> {
    /// Walk the top-level boxes of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_range(data, 0..data.len())
    }

    /// Walk the sibling boxes inside `range`
    pub fn with_range(data: &'a [u8], range: Range<usize>) -> Self {
        BoxWalker {
            data,
            pos: range.start,
            end: range.end.min(data.len()),
            done: false,
        }
    }

    /// Offset of the next box to be read
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for BoxWalker<'a> {
    type Item = Result<BoxRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match BoxHeader::parse(self.data, self.pos, self.end) {
            Ok(Some(header)) => {
                let record = BoxRecord {
                    offset: self.pos,
                    header,
                };
                // declared_size >= header_length >= 8, so this always advances
                self.pos += header.size();
                Some(Ok(record))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Container box types whose payload is itself a box sequence
pub fn is_container(box_type: &[u8; 4]) -> bool {
    matches!(
        box_type,
        atoms::MOOV | atoms::TRAK | atoms::MDIA | atoms::MINF | atoms::STBL
    )
}

/// Receives every box visited by `walk_tree`
pub trait BoxVisitor {
    fn visit(&mut self, record: &BoxRecord, depth: usize, data: &[u8]);
}

/// Depth-first walk of `range`, descending into container boxes.
///
/// Every box is handed to the visitor exactly once, parents before children.
/// Stops at the first malformed box and returns it; whatever the visitor
/// collected up to that point is left untouched.
pub fn walk_tree<V: BoxVisitor>(
    data: &[u8],
    range: Range<usize>,
    max_depth: usize,
    visitor: &mut V,
) -> Result<()> {
    walk_level(data, range, 0, max_depth, visitor)
}

fn walk_level<V: BoxVisitor>(
    data: &[u8],
    range: Range<usize>,
    depth: usize,
    max_depth: usize,
    visitor: &mut V,
) -> Result<()> {
    for record in BoxWalker::with_range(data, range) {
        let record = record?;
        debug!(
            offset = record.offset,
            size = record.header.declared_size,
            depth,
            "box {}",
            record.header.type_name()
        );
        visitor.visit(&record, depth, data);

        if is_container(&record.header.box_type) {
            if depth + 1 >= max_depth {
                warn!(
                    offset = record.offset,
                    "box nesting deeper than {} levels, not descending into {}",
                    max_depth,
                    record.header.type_name()
                );
                continue;
            }
            walk_level(data, record.payload_range(), depth + 1, max_depth, visitor)?;
        }
    }
    Ok(())
}

/// One entry of a flattened box tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxNode {
    pub depth: usize,
    pub offset: usize,
    pub header: BoxHeader,
}

#[derive(Default)]
struct TreeCollector {
    nodes: Vec<BoxNode>,
}

impl BoxVisitor for TreeCollector {
    fn visit(&mut self, record: &BoxRecord, depth: usize, _data: &[u8]) {
        self.nodes.push(BoxNode {
            depth,
            offset: record.offset,
            header: record.header,
        });
    }
}

/// Flatten the box tree of `data` in visit order.
///
/// A malformed box ends the listing; the nodes seen before it are returned
/// alongside the error.
pub fn box_tree(data: &[u8], max_depth: usize) -> (Vec<BoxNode>, Option<Error>) {
    let mut collector = TreeCollector::default();
    let error = walk_tree(data, 0..data.len(), max_depth, &mut collector).err();
    (collector.nodes, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_box(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(box_type);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_siblings_in_order() {
        let mut data = make_box(b"ftyp", &[0; 8]);
        data.extend(make_box(b"free", &[]));
        data.extend(make_box(b"mdat", &[1, 2, 3]));

        let records: Vec<_> = BoxWalker::new(&data).map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert!(records[0].is(b"ftyp"));
        assert_eq!(records[1].offset, 16);
        assert_eq!(records[2].payload_range(), 32..35);
    }

    #[test]
    fn test_trailing_bytes_stop_cleanly() {
        let mut data = make_box(b"free", &[]);
        data.extend_from_slice(&[0, 0, 0]);
        let mut walker = BoxWalker::new(&data);
        assert!(walker.next().unwrap().is_ok());
        assert!(walker.next().is_none());
        assert_eq!(walker.position(), 8);
    }

    #[test]
    fn test_malformed_yields_once() {
        let mut data = make_box(b"free", &[]);
        data.extend_from_slice(&[0, 0, 1, 0, b'm', b'd', b'a', b't']);
        let mut walker = BoxWalker::new(&data);
        assert!(walker.next().unwrap().is_ok());
        assert!(walker.next().unwrap().is_err());
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_tree_descends_into_containers() {
        let stbl = make_box(b"stbl", &make_box(b"stsz", &[0; 12]));
        let minf = make_box(b"minf", &stbl);
        let mdia = make_box(b"mdia", &minf);
        let trak = make_box(b"trak", &mdia);
        let mut moov_payload = make_box(b"mvhd", &[0; 20]);
        moov_payload.extend(trak);
        let mut data = make_box(b"ftyp", &[0; 8]);
        data.extend(make_box(b"moov", &moov_payload));

        let (nodes, error) = box_tree(&data, 16);
        assert!(error.is_none());
        let names: Vec<_> = nodes.iter().map(|n| n.header.type_name()).collect();
        assert_eq!(
            names,
            vec!["ftyp", "moov", "mvhd", "trak", "mdia", "minf", "stbl", "stsz"]
        );
        assert_eq!(nodes.last().unwrap().depth, 5);
    }

    #[test]
    fn test_depth_limit_treats_container_as_leaf() {
        let data = make_box(b"moov", &make_box(b"trak", &make_box(b"mdia", &[])));
        let (nodes, error) = box_tree(&data, 2);
        assert!(error.is_none());
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_leaf_payload_is_not_parsed() {
        // mdat payload looks like a box header but must not be descended into
        let data = make_box(b"mdat", &make_box(b"moov", &[]));
        let (nodes, _) = box_tree(&data, 16);
        assert_eq!(nodes.len(), 1);
    }
}
