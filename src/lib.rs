pub mod core;
pub mod storage;
pub mod bitmap;
pub mod index;
pub mod schema;

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                             SYNAPSDB STRUCT ARCHITECTURE                                    │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── CORE LAYER ──────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                               struct Database                                       │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ config: Config                    // Database configuration                  │ │    │
│  │  │ engine: Engine                    // Named datasets, file lock               │ │    │
│  │  │ documents: DocumentStore          // "documents": DocId -> JSON record       │ │    │
│  │  │ index: Index                      // hash2oid + four bitmap collections      │ │    │
│  │  │ meta: Arc<dyn Dataset>            // "meta": next_document_id                │ │    │
│  │  │ schemas: SchemaRegistry           // type -> DocumentSchema                  │ │    │
│  │  │ next_id: Mutex<u32>               // Single writer, ID counter               │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────┐  ┌──────────────────────┐  ┌───────────────────────────────────┐    │
│  │ struct Config    │  │ struct Document      │  │ struct DatabaseStats              │    │
│  │ • storage_path   │  │ • id: Option<DocId>  │  │ • total_documents                 │    │
│  │ • in_memory      │  │ • doc_type           │  │ • hash_index_entries              │    │
│  │ • compression    │  │ • index: Descriptor  │  │ • next_document_id                │    │
│  │ • sync_mode      │  │ • meta: Map          │  │ • collections: Vec<Collection..>  │    │
│  │ • document_cache │  │ • data: Value        │  │ • cached_bitmaps                  │    │
│  └──────────────────┘  └──────────────────────┘  └───────────────────────────────────┘    │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────────── INDEX LAYER ────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                                 struct Index                                        │    │
│  │  hash2oid: HashIndex              // checksum -> DocId, dedup                       │    │
│  │  cache: BitmapCache               // shared by all four collections                 │    │
│  │  internal: BitmapCollection       // [1000, 1_000_000)                              │    │
│  │  contexts: BitmapCollection       // [1_000_001, 2^32)                              │    │
│  │  features: BitmapCollection       // [1_000_001, 2^32)                              │    │
│  │  filters:  BitmapCollection       // [1_000_001, 2^32)                              │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌────────────────────────┐  ┌──────────────────────────┐  ┌────────────────────────┐      │
│  │ struct BitmapCollection│  │ struct BitmapCache       │  │ struct Bitmap          │      │
│  │ • tag: String          │  │ • entries: Arc<RwLock<   │  │ • key: String          │      │
│  │ • dataset: Arc<dyn ..> │  │   HashMap<String,Bitmap>>│  │ • range_min/range_max  │      │
│  │ • cache: BitmapCache   │  │ • "tag/key" entries      │  │ • inner: RoaringBitmap │      │
│  │ • write_lock: Mutex    │  └──────────────────────────┘  └────────────────────────┘      │
│  └────────────────────────┘                                                                 │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── STORAGE LAYER ───────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────┐  ┌──────────────────────────┐  ┌────────────────────────┐      │
│  │ struct Engine          │  │ trait Dataset            │  │ struct LogDataset      │      │
│  │ • layout: StorageLayout│  │ • get / put / has        │  │ • keys: key -> offset  │      │
│  │ • datasets: BTreeMap   │  │ • remove / get_many      │  │ • log: [len][crc][rec] │      │
│  │ • _lock: FileLock      │  │ • list_keys / keys_count │  │ • lz4 values           │      │
│  └────────────────────────┘  └──────────────────────────┘  └────────────────────────┘      │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────────── SCHEMA LAYER ───────────────────────────────────────┐
│                                                                                              │
│  SchemaRegistry ──maps──> DocumentSchema (document / note / tab / file)                      │
│        │                                                                                    │
│        ├──normalize()──> Document + meta.checksum (sha256 over checksum fields)              │
│        └──extract_features()──> static / dynamic feature tags                               │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────────── RELATIONSHIPS ────────────────────────────────────────────┐
│                                                                                              │
│  Database ──normalizes_with──> SchemaRegistry                                               │
│     │                                                                                       │
│     ├──owns──> DocumentStore ──stores_in──> Dataset("documents")                           │
│     │                                                                                       │
│     ├──owns──> Index ──owns──> HashIndex ──stores_in──> Dataset("hash2oid")                │
│     │            │                                                                          │
│     │            └──owns──> BitmapCollection ──stores_in──> Dataset("bitmaps/<tag>")       │
│     │                              │                                                        │
│     │                              └──shares──> BitmapCache ──holds──> Bitmap              │
│     │                                                                                       │
│     └──owns──> Engine ──creates──> LogDataset | MemoryDataset                              │
│                                                                                              │
│  insert: normalize -> hash2oid lookup -> (allocate id) -> documents.put -> tick bitmaps    │
│  query:  contexts AND features AND filters -> ids -> documents.get_many                     │
│  delete: documents.remove -> hash2oid.remove -> untick_all on every collection (rayon)     │
│                                                                                              │
└──────────────────────────────────────────────────────────────────────────────────────────────┘
*/
