use crate::conn::TcpClient;
use crate::protocol::util_sync;
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

// The protocol prolog: client and server exchange a fixed initialization
// record before any session exists. The client names the protocol version it
// speaks; the server's answer is ignored except for being consumed.
pub(crate) fn send_and_receive(tcp_client: &mut TcpClient) -> crate::HdbResult<()> {
    trace!("send_and_receive(): send");
    emit_initial_request(tcp_client.writer())?;

    trace!("send_and_receive(): receive");
    util_sync::skip_bytes(8, tcp_client.reader()) // ignore the response content
        .map_err(|e| {
            trace!("skipping over the initial response failed with {e:?}");
            e
        })?;
    debug!("successfully initialized");
    Ok(())
}

fn emit_initial_request(w: &mut dyn std::io::Write) -> std::io::Result<()> {
    w.write_all(initial_request())?;
    w.flush()
}

fn initial_request() -> &'static [u8] {
    lazy_static! {
        pub(crate) static ref INITIAL_REQUEST: Box<[u8]> = {
            const FILLER: i32 = -1;
            const MAJOR_PRODUCT_VERSION: i8 = 4;
            const MINOR_PRODUCT_VERSION: i16 = 20;
            const MAJOR_PROTOCOL_VERSION: i8 = 4;
            const MINOR_PROTOCOL_VERSION: i16 = 1;
            const RESERVED: i8 = 0;
            const NUMBER_OF_OPTIONS: i8 = 1;
            const OPTION_ID_SWAPKIND: i8 = 1;
            const LITTLE_ENDIAN: i8 = 1;

            let mut c = std::io::Cursor::new(vec![0_u8; 14]);
            Write::write_all(&mut c, &FILLER.to_be_bytes()).unwrap();
            WriteBytesExt::write_i8(&mut c, MAJOR_PRODUCT_VERSION).unwrap();
            WriteBytesExt::write_i16::<BigEndian>(&mut c, MINOR_PRODUCT_VERSION).unwrap();
            WriteBytesExt::write_i8(&mut c, MAJOR_PROTOCOL_VERSION).unwrap();
            WriteBytesExt::write_i16::<BigEndian>(&mut c, MINOR_PROTOCOL_VERSION).unwrap();
            WriteBytesExt::write_i8(&mut c, RESERVED).unwrap();
            WriteBytesExt::write_i8(&mut c, NUMBER_OF_OPTIONS).unwrap();
            WriteBytesExt::write_i8(&mut c, OPTION_ID_SWAPKIND).unwrap();
            WriteBytesExt::write_i8(&mut c, LITTLE_ENDIAN).unwrap();
            Write::flush(&mut c).unwrap();
            let res = c.into_inner().into_boxed_slice();
            assert_eq!(res.len(), 14);
            res
        };
    }
    &INITIAL_REQUEST
}

#[cfg(test)]
mod test {
    #[test]
    fn test_initial_request_bytes() {
        let bytes = super::initial_request();
        assert_eq!(bytes.len(), 14);
        // filler
        assert_eq!(&bytes[0..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
        // protocol version 4.1
        assert_eq!(bytes[7], 4);
        assert_eq!(&bytes[8..10], &[0, 1]);
        // exactly one option: swap kind = little endian
        assert_eq!(&bytes[11..14], &[1, 1, 1]);
    }
}
