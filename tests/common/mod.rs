#![allow(dead_code)]

use bzn::FieldType;

/// Builder for text mode fixtures
pub struct TextBzn {
    magic: &'static str,
    eol: &'static str,
    lines: Vec<String>,
}

impl TextBzn {
    pub fn bz1() -> TextBzn {
        TextBzn {
            magic: "BZN1",
            eol: "\r\n",
            lines: Vec::new(),
        }
    }

    pub fn bz2() -> TextBzn {
        TextBzn {
            magic: "BZN2",
            eol: "\r\n",
            lines: Vec::new(),
        }
    }

    pub fn eol(mut self, eol: &'static str) -> TextBzn {
        self.eol = eol;
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> TextBzn {
        self.lines.push(line.into());
        self
    }

    pub fn field(self, name: &str, ty: FieldType, value: &str) -> TextBzn {
        let line = format!("{} [{}] = {}", name, ty.mnemonic(), value);
        self.line(line)
    }

    pub fn marker(self, name: &str) -> TextBzn {
        self.line(format!("[{}]", name))
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = format!("{}T{}", self.magic, self.eol);
        for line in &self.lines {
            out.push_str(line);
            out.push_str(self.eol);
        }
        out.into_bytes()
    }
}

/// Builder for binary mode fixtures
pub struct BinBzn {
    type_size: usize,
    size_size: usize,
    alignment: usize,
    big_endian: bool,
    buf: Vec<u8>,
}

impl BinBzn {
    pub fn bz1() -> BinBzn {
        BinBzn {
            type_size: 2,
            size_size: 4,
            alignment: 1,
            big_endian: false,
            buf: b"BZN1B".to_vec(),
        }
    }

    pub fn bz2() -> BinBzn {
        BinBzn {
            type_size: 1,
            size_size: 2,
            alignment: 1,
            big_endian: false,
            buf: b"BZN2B".to_vec(),
        }
    }

    pub fn n64(version: u16) -> BinBzn {
        let mut buf = b"N64BB".to_vec();
        buf.extend_from_slice(&version.to_be_bytes());
        buf.push(0);
        BinBzn {
            type_size: 2,
            size_size: 2,
            alignment: 4,
            big_endian: true,
            buf,
        }
    }

    fn push_uint(&mut self, value: u32, width: usize) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        if self.big_endian {
            self.buf.extend_from_slice(&bytes[4 - width..]);
        } else {
            self.buf.extend_from_slice(&bytes[..width]);
        }
    }

    pub fn field(mut self, name: &str, ty: FieldType, payload: &[u8]) -> BinBzn {
        self.buf.push(name.len() as u8);
        self.buf.extend_from_slice(name.as_bytes());
        self.push_uint(u32::from(ty.tag()), self.type_size);
        self.push_uint(payload.len() as u32, self.size_size);
        self.buf.extend_from_slice(payload);
        while self.buf.len() % self.alignment != 0 {
            self.buf.push(0);
        }
        self
    }

    fn scalar(&self, value: u32) -> [u8; 4] {
        if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }

    pub fn long(self, name: &str, value: i32) -> BinBzn {
        let bytes = self.scalar(value as u32);
        self.field(name, FieldType::Long, &bytes)
    }

    pub fn boolean(self, name: &str, value: bool) -> BinBzn {
        self.field(name, FieldType::Bool, &[u8::from(value)])
    }

    pub fn short(self, name: &str, value: u16) -> BinBzn {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.field(name, FieldType::Short, &bytes)
    }

    pub fn float(self, name: &str, value: f32) -> BinBzn {
        let bytes = self.scalar(value.to_bits());
        self.field(name, FieldType::Float, &bytes)
    }

    pub fn chars(self, name: &str, value: &str) -> BinBzn {
        self.field(name, FieldType::Char, value.as_bytes())
    }

    pub fn ptr(self, name: &str, value: u32) -> BinBzn {
        let bytes = self.scalar(value);
        self.field(name, FieldType::Ptr, &bytes)
    }

    pub fn void(self, name: &str) -> BinBzn {
        self.field(name, FieldType::Void, &[])
    }

    pub fn vec2d(self, name: &str, points: &[(f32, f32)]) -> BinBzn {
        let mut payload = Vec::with_capacity(points.len() * 8);
        let big_endian = self.big_endian;
        for &(x, z) in points {
            let (xb, zb) = if big_endian {
                (x.to_bits().to_be_bytes(), z.to_bits().to_be_bytes())
            } else {
                (x.to_bits().to_le_bytes(), z.to_bits().to_le_bytes())
            };
            payload.extend_from_slice(&xb);
            payload.extend_from_slice(&zb);
        }
        self.field(name, FieldType::Vec2d, &payload)
    }

    /// Raw bytes with no token framing, padded to alignment
    pub fn raw(mut self, bytes: &[u8]) -> BinBzn {
        self.buf.extend_from_slice(bytes);
        while self.buf.len() % self.alignment != 0 {
            self.buf.push(0);
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
