//! Character-level Myers O(ND) difference with bisection.
//!
//! Mirrors json-joy's `util/diff/str` routines (prefix/suffix search,
//! bisection and merge cleanup), which follow diff-match-patch.
//!
//! All lengths and positions are in Unicode scalar values (`char`s).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Delete,
    Equal,
    Insert,
}

pub type Edit = (EditOp, String);

/// Computes the edits turning `src` into `dst`. Consecutive edits of the same
/// kind are merged and no edit is empty.
pub fn diff(src: &str, dst: &str) -> Vec<Edit> {
    let src: Vec<char> = src.chars().collect();
    let dst: Vec<char> = dst.chars().collect();
    let mut edits = diff_chars(&src, &dst);
    cleanup_merge(&mut edits);
    edits
}

/// The text an edit list was computed from.
pub fn source_text(edits: &[Edit]) -> String {
    edits
        .iter()
        .filter(|(op, _)| *op != EditOp::Insert)
        .map(|(_, text)| text.as_str())
        .collect()
}

/// The text an edit list produces.
pub fn target_text(edits: &[Edit]) -> String {
    edits
        .iter()
        .filter(|(op, _)| *op != EditOp::Delete)
        .map(|(_, text)| text.as_str())
        .collect()
}

pub(crate) fn common_prefix(c1: &[char], c2: &[char]) -> usize {
    if c1.is_empty() || c2.is_empty() || c1[0] != c2[0] {
        return 0;
    }
    let mut min = 0usize;
    let mut max = c1.len().min(c2.len());
    let mut mid = max;
    let mut start = 0;
    while min < mid {
        if c1[start..mid] == c2[start..mid] {
            min = mid;
            start = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

pub(crate) fn common_suffix(c1: &[char], c2: &[char]) -> usize {
    let n1 = c1.len();
    let n2 = c2.len();
    if n1 == 0 || n2 == 0 || c1[n1 - 1] != c2[n2 - 1] {
        return 0;
    }
    let mut min = 0usize;
    let mut max = n1.min(n2);
    let mut mid = max;
    let mut end = 0;
    while min < mid {
        if c1[n1 - mid..n1 - end] == c2[n2 - mid..n2 - end] {
            min = mid;
            end = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn text(chars: &[char]) -> String {
    chars.iter().collect()
}

fn diff_chars(src: &[char], dst: &[char]) -> Vec<Edit> {
    if src == dst {
        return if src.is_empty() {
            Vec::new()
        } else {
            vec![(EditOp::Equal, text(src))]
        };
    }

    let prefix_len = common_prefix(src, dst);
    let (prefix, src, dst) = (&src[..prefix_len], &src[prefix_len..], &dst[prefix_len..]);

    let suffix_len = common_suffix(src, dst);
    let suffix = &src[src.len() - suffix_len..];
    let src = &src[..src.len() - suffix_len];
    let dst = &dst[..dst.len() - suffix_len];

    let mut edits = Vec::new();
    if !prefix.is_empty() {
        edits.push((EditOp::Equal, text(prefix)));
    }
    edits.extend(diff_middle(src, dst));
    if !suffix.is_empty() {
        edits.push((EditOp::Equal, text(suffix)));
    }
    edits
}

/// Diff of two texts that share no common prefix or suffix.
fn diff_middle(src: &[char], dst: &[char]) -> Vec<Edit> {
    if src.is_empty() {
        return if dst.is_empty() {
            Vec::new()
        } else {
            vec![(EditOp::Insert, text(dst))]
        };
    }
    if dst.is_empty() {
        return vec![(EditOp::Delete, text(src))];
    }

    let (long, short, long_is_src) = if src.len() > dst.len() {
        (src, dst, true)
    } else {
        (dst, src, false)
    };
    if let Some(at) = find(long, short) {
        let op = if long_is_src {
            EditOp::Delete
        } else {
            EditOp::Insert
        };
        let mut edits = Vec::with_capacity(3);
        if at > 0 {
            edits.push((op, text(&long[..at])));
        }
        edits.push((EditOp::Equal, text(short)));
        if at + short.len() < long.len() {
            edits.push((op, text(&long[at + short.len()..])));
        }
        return edits;
    }

    if short.len() == 1 {
        return vec![(EditOp::Delete, text(src)), (EditOp::Insert, text(dst))];
    }

    bisect(src, dst)
}

/// Finds the middle snake and splits the problem in two.
fn bisect(c1: &[char], c2: &[char]) -> Vec<Edit> {
    let n1 = c1.len() as i64;
    let n2 = c2.len() as i64;
    let max_d = (n1 + n2 + 1) / 2 + 1;
    let v_offset = max_d;
    let v_length = 2 * max_d;

    let mut v1: Vec<i64> = vec![-1; v_length as usize];
    let mut v2: Vec<i64> = vec![-1; v_length as usize];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = n1 - n2;
    // When the total length is odd, the forward path detects the overlap.
    let front = delta % 2 != 0;

    let mut k1start = 0i64;
    let mut k1end = 0i64;
    let mut k2start = 0i64;
    let mut k2end = 0i64;

    for d in 0..max_d {
        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = v_offset + k1;
            let mut x1 = if k1 == -d
                || (k1 != d && v1[(k1_offset - 1) as usize] < v1[(k1_offset + 1) as usize])
            {
                v1[(k1_offset + 1) as usize]
            } else {
                v1[(k1_offset - 1) as usize] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n1 && y1 < n2 && c1[x1 as usize] == c2[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset as usize] = x1;
            if x1 > n1 {
                k1end += 2;
            } else if y1 > n2 {
                k1start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && k2_offset < v_length && v2[k2_offset as usize] != -1 {
                    let x2 = n1 - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return bisect_split(c1, c2, x1 as usize, y1 as usize);
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = v_offset + k2;
            let mut x2 = if k2 == -d
                || (k2 != d && v2[(k2_offset - 1) as usize] < v2[(k2_offset + 1) as usize])
            {
                v2[(k2_offset + 1) as usize]
            } else {
                v2[(k2_offset - 1) as usize] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n1
                && y2 < n2
                && c1[(n1 - x2 - 1) as usize] == c2[(n2 - y2 - 1) as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset as usize] = x2;
            if x2 > n1 {
                k2end += 2;
            } else if y2 > n2 {
                k2start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && k1_offset < v_length && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    if x1 >= n1 - x2 {
                        return bisect_split(c1, c2, x1 as usize, y1 as usize);
                    }
                }
            }
            k2 += 2;
        }
    }

    vec![(EditOp::Delete, text(c1)), (EditOp::Insert, text(c2))]
}

fn bisect_split(c1: &[char], c2: &[char], x: usize, y: usize) -> Vec<Edit> {
    let mut edits = diff_chars(&c1[..x], &c2[..y]);
    edits.extend(diff_chars(&c1[x..], &c2[y..]));
    edits
}

/// Merges adjacent edits of the same kind and factors common prefixes and
/// suffixes out of delete/insert pairs, then slides single edits sideways
/// where that removes an equality.
pub(crate) fn cleanup_merge(edits: &mut Vec<Edit>) {
    edits.push((EditOp::Equal, String::new()));
    let mut pointer = 0usize;
    let mut del_cnt = 0usize;
    let mut ins_cnt = 0usize;
    let mut del_txt: Vec<char> = Vec::new();
    let mut ins_txt: Vec<char> = Vec::new();

    while pointer < edits.len() {
        if pointer < edits.len() - 1 && edits[pointer].1.is_empty() {
            edits.remove(pointer);
            continue;
        }
        match edits[pointer].0 {
            EditOp::Insert => {
                ins_cnt += 1;
                ins_txt.extend(edits[pointer].1.chars());
                pointer += 1;
            }
            EditOp::Delete => {
                del_cnt += 1;
                del_txt.extend(edits[pointer].1.chars());
                pointer += 1;
            }
            EditOp::Equal => {
                if del_cnt + ins_cnt > 0 {
                    if !del_txt.is_empty() && !ins_txt.is_empty() {
                        let common = common_prefix(&ins_txt, &del_txt);
                        if common > 0 {
                            let prefix = text(&ins_txt[..common]);
                            let prev = pointer as i64 - (del_cnt + ins_cnt) as i64 - 1;
                            if prev >= 0 && edits[prev as usize].0 == EditOp::Equal {
                                edits[prev as usize].1.push_str(&prefix);
                            } else {
                                edits.insert(0, (EditOp::Equal, prefix));
                                pointer += 1;
                            }
                            ins_txt.drain(..common);
                            del_txt.drain(..common);
                        }
                        let common = common_suffix(&ins_txt, &del_txt);
                        if common > 0 {
                            let suffix = text(&ins_txt[ins_txt.len() - common..]);
                            edits[pointer].1.insert_str(0, &suffix);
                            ins_txt.truncate(ins_txt.len() - common);
                            del_txt.truncate(del_txt.len() - common);
                        }
                    }

                    let start = pointer - del_cnt - ins_cnt;
                    let mut replacement = Vec::with_capacity(2);
                    if !del_txt.is_empty() {
                        replacement.push((EditOp::Delete, text(&del_txt)));
                    }
                    if !ins_txt.is_empty() {
                        replacement.push((EditOp::Insert, text(&ins_txt)));
                    }
                    let inserted = replacement.len();
                    edits.splice(start..pointer, replacement);
                    pointer = start + inserted;
                }

                if pointer != 0 && edits[pointer - 1].0 == EditOp::Equal {
                    let current = std::mem::take(&mut edits[pointer].1);
                    edits[pointer - 1].1.push_str(&current);
                    edits.remove(pointer);
                } else {
                    pointer += 1;
                }

                ins_cnt = 0;
                del_cnt = 0;
                del_txt.clear();
                ins_txt.clear();
            }
        }
    }

    if edits.last().is_some_and(|(_, text)| text.is_empty()) {
        edits.pop();
    }

    let mut changes = false;
    let mut pointer = 1usize;
    while pointer + 1 < edits.len() {
        if edits[pointer - 1].0 == EditOp::Equal && edits[pointer + 1].0 == EditOp::Equal {
            let prev: Vec<char> = edits[pointer - 1].1.chars().collect();
            let cur: Vec<char> = edits[pointer].1.chars().collect();
            let next: Vec<char> = edits[pointer + 1].1.chars().collect();

            if cur.len() >= prev.len() && cur[cur.len() - prev.len()..] == prev[..] {
                // Slide the edit left over the previous equality.
                edits[pointer].1 = prev.iter().chain(&cur[..cur.len() - prev.len()]).collect();
                edits[pointer + 1].1 = prev.iter().chain(&next).collect();
                edits.remove(pointer - 1);
                changes = true;
            } else if cur.len() >= next.len() && cur[..next.len()] == next[..] {
                // Slide the edit right over the next equality.
                edits[pointer - 1].1 = prev.iter().chain(&next).collect();
                edits[pointer].1 = cur[next.len()..].iter().chain(&next).collect();
                edits.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(edits);
    }
}
