use std::{collections::HashSet, sync::Arc, thread};

use ld_anoncreds::{
    elliptic_elgamal_decrypt, elliptic_elgamal_key_gen, encrypt_uid, key_gen, uid_matches,
    Backend, BackendState,
};

#[test]
fn encrypted_uids_are_unlinkable() {
    let backend = Backend::default();
    backend.initialize();
    let keypair = elliptic_elgamal_key_gen(&backend).unwrap();

    let ciphertexts = (0..10)
        .map(|_| encrypt_uid(&backend, b"did:example:holder", &keypair.public_key).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(ciphertexts.iter().collect::<HashSet<_>>().len(), 10);

    let decrypted = ciphertexts
        .iter()
        .map(|c| elliptic_elgamal_decrypt(&backend, &keypair.secret_key, c).unwrap())
        .collect::<HashSet<_>>();
    assert_eq!(decrypted.len(), 1);
    assert!(ciphertexts
        .iter()
        .all(|c| uid_matches(&backend, &keypair.secret_key, c, b"did:example:holder").unwrap()));
}

#[test]
fn elgamal_keys_are_not_signature_keys() {
    let backend = Backend::default();
    backend.initialize();
    let elgamal = elliptic_elgamal_key_gen(&backend).unwrap();
    let bbs = key_gen(&backend).unwrap();
    // A G2 public key does not decode as an ElGamal key
    assert!(encrypt_uid(&backend, b"uid", &bbs.public_key).is_err());
    assert!(encrypt_uid(&backend, b"uid", &elgamal.public_key).is_ok());
}

#[test]
fn shared_backend() {
    let backend = Arc::new(Backend::default());
    assert_eq!(backend.state(), BackendState::Uninitialized);
    let handles = (0..4)
        .map(|i| {
            let backend = backend.clone();
            thread::spawn(move || {
                backend.initialize();
                let keypair = elliptic_elgamal_key_gen(&backend).unwrap();
                let uid = format!("uid-{}", i);
                let c = encrypt_uid(&backend, uid.as_bytes(), &keypair.public_key).unwrap();
                uid_matches(&backend, &keypair.secret_key, &c, uid.as_bytes()).unwrap()
            })
        })
        .collect::<Vec<_>>();
    assert!(handles.into_iter().all(|h| h.join().unwrap()));
    assert_eq!(backend.state(), BackendState::Ready);
}
